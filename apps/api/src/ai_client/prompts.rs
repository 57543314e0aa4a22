// Shared prompt fragments. Each analysis mode has its own template in
// analysis::prompts; the fragments here are the output contract every mode
// shares with the response parser.

/// Line format the parser looks for first when reading the score.
pub const PERCENTAGE_INSTRUCTION: &str = "\
    Begin your answer with a single line of the exact form `Match Percentage: NN%`, \
    where NN is an integer from 0 to 100 estimating how well the resume fits the job.";

/// Keyword sections the parser collects into matched/missing lists.
pub const KEYWORD_SECTIONS_INSTRUCTION: &str = "\
    Then include a section headed `Matched Keywords:` listing, one per bullet, the job \
    description keywords and skills that are present in the resume, and a section headed \
    `Missing Keywords:` listing, one per bullet, the keywords and skills the job requires \
    that the resume lacks. Keep each bullet to the keyword itself.";

/// Keeps the model from inventing experience the resume does not show.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every statement only on the resume and job description provided. \
    Do NOT assume skills, employers or credentials that are not written there.";
