// All LLM prompt constants for the screening module.
// Templates use `{placeholder}` markers replaced with `str::replace` before sending.

/// Structured candidate extraction. Replace `{resume_text}`.
pub const ENTITY_EXTRACTION_PROMPT: &str = r#"Extract structured candidate information from the resume below.

Return a JSON object with exactly these fields:
{
  "name": string or null,
  "email": string or null,
  "phone": string or null,
  "yearsExperience": number or null,
  "educationLevel": one of "none", "bachelor", "master", "phd",
  "skills": array of short skill names
}

{no_invention}

RESUME:
{resume_text}"#;

/// Skill-only extraction for job descriptions and free-form profiles. Replace `{text}`.
pub const SKILL_EXTRACTION_PROMPT: &str = r#"List the professional skills mentioned in the text below.
Include technologies, tools, domain knowledge and soft skills. Use short canonical names
("react", "node.js", "communication"), at most 40 entries.

Return a JSON object: {"skills": ["skill", ...]}

{no_invention}

TEXT:
{text}"#;

/// Recruiter rubric for one screened candidate.
/// Replace `{job_title}`, `{job_text}`, `{candidate_profile}`, `{final_score}`.
pub const EVALUATION_PROMPT: &str = r#"You are assisting a recruiter screening candidates for the role "{job_title}".

JOB DESCRIPTION:
{job_text}

CANDIDATE PROFILE (extracted from the resume):
{candidate_profile}

The automated fit score for this candidate is {final_score}/100.

Return a JSON object:
{
  "decision": one of "strong_yes", "yes", "maybe", "no",
  "summary": one or two sentences,
  "strengths": exactly 3 short strings,
  "gaps": exactly 3 short strings,
  "questions": 3 to 5 interview questions
}"#;

/// Cuts `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
