/// Prompt asking the model for question/answer pairs in the `Q<n>:`/`A<n>:` convention.
pub static QA_GENERATION_INSTRUCTIONS: &str = r"I will give you a passage of text that may cover several topics. Study it and organise what you learned as follows:
1. Ask at most 25 questions about the text.
2. Give an answer to every question.
3. Answers must be detailed and complete; they may contain plain text, links, code, tables, formulas and other markdown elements.
4. Return the questions and answers in exactly this format:

Q1: question
A1: answer
Q2: question
A2: answer
...

My text:
";

pub fn qa_generation_prompt(chunk: &str) -> String {
    format!("{QA_GENERATION_INSTRUCTIONS}{chunk}")
}
