// All LLM prompt templates for the extraction stages.
// Placeholders are filled with `llm_client::prompts::fill`.

/// Job posting extraction. Replace `{page_data}` and `{json_only}`.
pub const JOB_EXTRACT_PROMPT: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}

### INSTRUCTION:
The scraped text comes from a careers page and describes a single job posting.
Extract the posting as a JSON object with exactly these keys:

- `title`: the main position title.
- `requirements`: a list of every specific requirement mentioned for the job.
- `responsibilities`: a concise summary of the main responsibilities of the role.
- `experience_years`: the required experience in years.
  - If an exact number of years is given (e.g. "3 years"), use that integer.
  - If a minimum is given (e.g. "5+ years", "at least 5 years"), use the string "5+".
  - If a range is given (e.g. "3-5 years"), use the lower bound as a minimum: "3+".
  - If experience is only implied (e.g. "senior" or "junior"), use the string ">0".
  - If there is no indication of experience, use 0.

{json_only}
### VALID JSON (NO PREAMBLE):"#;

/// Profile README extraction. Replace `{page_data}` and `{json_only}`.
pub const PROFILE_EXTRACT_PROMPT: &str = r#"### SCRAPED TEXT FROM GITHUB README:
{page_data}

### INSTRUCTION:
The text above is a GitHub profile README describing an individual's professional
background. Extract the following as a JSON object, always including all five keys:

- `role`: a list of the individual's roles or titles, primary role first. If no role
  is stated, use the area the individual specialises in as the primary role.
- `experience_duration`: years of experience as an integer; 0 if the individual is a student.
- `experience`: a brief summary of relevant experience, areas of expertise and domains
  (e.g. data science, machine learning, cloud computing).
- `skills`: a list of key technical and non-technical skills highlighted in the README,
  such as languages, frameworks, tools and soft skills.
- `description`: a concise introduction to the individual's background, education or
  current focus.

Rules:
- Only include information explicitly present in the README text.
- `experience_duration` must be an integer (e.g. 2 for two years, 0 for a student).
- When a field is not available, use "" for text fields and [] for list fields.

{json_only}
### VALID JSON (NO PREAMBLE):"#;

/// Generic content summary. Replace `{content}`.
pub const SUMMARIZE_PROMPT: &str = r#"### CONTENT TO SUMMARIZE:
{content}

### INSTRUCTION:
Provide a concise summary of the content above, focusing on the main technologies,
functionality and purpose where relevant.

### SUMMARY:"#;

/// Project classification. Replace `{project_info}`.
pub const CLASSIFY_PROMPT: &str = r#"### PROJECT INFORMATION:
{project_info}

### INSTRUCTION:
Based on the project name, language, requirements and README summary above, provide:
- the project type (e.g. Machine Learning, Data Visualization, Web Application)
- the main technologies used, comma-separated
- the primary goal or purpose of the project

### OUTPUT (AS THREE SEPARATE LINES WITHOUT LABELS):"#;
