use serde::Serialize;

/// A single step of the multi-step questionnaire form.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub question: &'static str,
    pub placeholder: &'static str,
}

/// The questionnaire, in the order the form presents it.
pub const QUESTIONS: &[Question] = &[
    Question {
        id: "current_role",
        question: "What is your current role or most recent position?",
        placeholder: "E.g., Senior Software Engineer at a fintech startup",
    },
    Question {
        id: "years_experience",
        question: "How many years of professional experience do you have?",
        placeholder: "E.g., 6 years, including 2 in a lead role",
    },
    Question {
        id: "key_skills",
        question: "What are your top 3-5 professional skills or competencies?",
        placeholder: "E.g., system design, stakeholder management, Python...",
    },
    Question {
        id: "education",
        question: "What is your educational background?",
        placeholder: "E.g., BSc Computer Science, online data science certificate...",
    },
    Question {
        id: "career_achievements",
        question: "What are 2-3 of your most significant career achievements?",
        placeholder: "E.g., led a migration that cut costs by 30%...",
    },
    Question {
        id: "job_seeking",
        question: "What type of role are you currently looking for?",
        placeholder: "E.g., engineering manager in a remote-first company",
    },
    Question {
        id: "cv_challenges",
        question: "What aspects of your CV or resume do you feel need improvement?",
        placeholder: "E.g., highlighting achievements, addressing gaps, formatting...",
    },
    Question {
        id: "interview_challenges",
        question: "What has been your biggest challenge in past interviews?",
        placeholder: "E.g., behavioral questions, technical assessments, salary negotiation...",
    },
    Question {
        id: "soft_skills",
        question: "Which soft skills would you like to improve for your career progression?",
        placeholder: "E.g., public speaking, delegation, negotiation...",
    },
    Question {
        id: "career_goals",
        question: "What are your primary career goals for the next 12 months?",
        placeholder: "E.g., land a staff role, earn a cloud certification...",
    },
];

/// Position of a question id in the catalog, if it belongs to it.
pub fn catalog_position(id: &str) -> Option<usize> {
    QUESTIONS.iter().position(|q| q.id == id)
}
