// Prompt templates for letter composition.

/// Retrieval query sent to the knowledge store.
/// Replace: {job_title}, {job_requirements}, {job_responsibilities}
pub const RETRIEVAL_QUERY_TEMPLATE: &str = "Generate a job application letter for the position '{job_title}'. \
Focus on user projects, skills, and experiences that demonstrate alignment with the following requirements:\n\
{job_requirements}\n\
and responsibilities:\n\
{job_responsibilities}\n\
Identify relevant information to emphasize the user's qualifications and enthusiasm for the position.";

/// Letter generation prompt.
/// Replace: {job_title}, {job_requirements}, {job_responsibilities},
///          {experience_years}, {relevant_projects}
pub const LETTER_PROMPT_TEMPLATE: &str = r#"### JOB AND USER INFORMATION:
Job Title: {job_title}
Requirements: {job_requirements}
Responsibilities: {job_responsibilities}
Required Experience: {experience_years}
Relevant User Projects:
{relevant_projects}

### INSTRUCTION:
Write a job application letter for the user, emphasizing their relevant skills and
experience in line with the job title, requirements and responsibilities. Mention
specific projects by name, placing each project name in parentheses, and briefly
explain how each project supports the user's qualifications and demonstrates their
expertise against the job's demands.

### APPLICATION LETTER:"#;
