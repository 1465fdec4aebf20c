// Agent prompt templates.
// Placeholders in braces are substituted with `str::replace` before sending.
// Literal JSON braces in the example shapes are left as-is.

/// Agent1. Replace `{hr_data}`.
pub const HR_ANALYTICS_PROMPT: &str = r#"You are an HR analytics and automation assistant.
Analyze the HR dataset below and produce:
1. A short trend analysis covering staffing, hiring, attrition and exit reasons.
2. Headline counts of recruits, resignations and terminations.
3. Concrete, domain-specific HR tasks. Tag every task with Agent_ID 1.

Return exactly this JSON shape:
{
  "Analysis": "...",
  "Recruits": "value",
  "Resigned": "value",
  "Fired": "value",
  "tasks": [
    {"Agent_ID": 1, "task_description": "..."},
    {"Agent_ID": 1, "task_description": "..."}
  ]
}

HR data:
{hr_data}"#;

/// Agent2. Replace `{company_news}`.
pub const COMPANY_NEWS_PROMPT: &str = r#"You are an assistant that summarizes company news for the HR team.
Given the company news updates below:
1. Summarize the key company developments.
2. Explain how they affect hiring, staffing strategy and employee engagement.
3. Propose HR tasks, e.g. planning new job listings, updating benefits,
   hiring for expanding teams, adjusting HR policy or communication.
   Tag every task with Agent_ID 2.

Company news:
{company_news}

Return exactly this JSON shape:
{
  "Analysis": "Summary of developments and their HR implications",
  "Company_news": [...],
  "tasks": [
    {"Agent_ID": 2, "task_description": "..."},
    {"Agent_ID": 2, "task_description": "..."}
  ]
}"#;

/// Agent3. Replace `{notifications}` and `{departments}`.
pub const TASK_DISTRIBUTION_PROMPT: &str = r#"You are an HR task distributor.
Read the management notifications below and turn them into clear task
assignments for the departments listed.

Notifications:
{notifications}

Departments:
{departments}

Instructions:
1. Work out the intent behind each notification (hiring, reporting, survey, ...).
2. Distribute the work department by department.
3. Tag every task with Agent_ID 3.
4. Keep every task directly actionable.

Return exactly this JSON shape:
{
  "Analysis": "Overall reading of the notifications and their intent",
  "Notifications": [...],
  "tasks": [
    {"Agent_ID": 3, "task_description": "Department: <Dept> -> <Task details>"}
  ]
}"#;

/// Agent5. Replace `{employees}` and `{performance}`.
pub const PAYROLL_PROMPT: &str = r#"You are a payroll assistant.

Employees:
{employees}

Performance reports:
{performance}

Tasks:
1. Compute each employee's pay: an estimated base salary for the role,
   tax deductions of roughly 10-15%, performance-based bonus, benefits.
2. Flag payroll anomalies such as missing data or implausible values.
3. Produce one payslip per employee.
4. Summarize total payroll cost, average salary and the anomalies.

Return exactly this JSON shape (numbers as JSON numbers):
{
  "Payroll_Analysis": "High-level payroll status and anomalies",
  "Payslips": [
    {
      "Employee": "string",
      "Department": "string",
      "Base_Salary": 0,
      "Tax_Deduction": 0,
      "Bonus": 0,
      "Net_Pay": 0,
      "Remarks": "string"
    }
  ],
  "Summary": {
    "Total_Payroll_Cost": 0,
    "Average_Salary": 0,
    "Anomalies": ["..."]
  }
}"#;

/// Assessment generation. Replace `{question_count}`, `{aptitude_count}`,
/// `{domain_count}`, `{job_description}` and `{applicant_cv}`.
pub const ASSESSMENT_GENERATE_PROMPT: &str = r#"You are a recruitment test generator.

Job description:
{job_description}

Applicant CV:
{applicant_cv}

Write {question_count} interview-style questions:
- {aptitude_count} aptitude, logical reasoning or quantitative questions
- {domain_count} domain-specific questions based on the role and the CV's skills
- a mix of multiple choice (MCQ), short answer (ShortAnswer) and fill-in-the-blank (FillBlank)
- in the style used by large technology companies' screening tests

Number the questions with sequential ids starting at 1.
"options" is required for MCQ and must be omitted otherwise.

Return exactly this JSON shape:
{
  "questions": [
    {
      "id": 1,
      "type": "MCQ",
      "question": "string",
      "options": ["A", "B", "C", "D"],
      "correct_answer": "string"
    }
  ]
}"#;

/// Assessment evaluation. Replace `{questions_with_answers}` and `{user_responses}`.
pub const ASSESSMENT_EVALUATE_PROMPT: &str = r#"You are an HR evaluation assistant.
Grade the applicant's answers to the test below.

Questions with correct answers:
{questions_with_answers}

Applicant responses:
{user_responses}

Instructions:
- Compare each response with the correct answer.
- Give partial credit when an answer is close.
- Scale the total to a score between 0.0 and 10.0.
- Add short feedback on strengths and weak areas.

Return exactly this JSON shape:
{
  "score": 7.5,
  "feedback": "string"
}"#;
