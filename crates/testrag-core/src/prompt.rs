//! Prompt template for context-grounded answers

/// Render the prompt sent to the LLM when retrieved context is available
pub fn render_prompt(question: &str, context: &str) -> String {
    format!(
        "Context information:\n{context}\n\n\
         Question: {question}\n\n\
         Answer the question based on the context provided above. \
         If the context doesn't contain relevant information, say so."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt_layout() {
        let prompt = render_prompt("What is X?", "[Similarity: 0.9000]\nX is a letter.");

        let expected = "Context information:\n\
                        [Similarity: 0.9000]\nX is a letter.\n\n\
                        Question: What is X?\n\n\
                        Answer the question based on the context provided above. \
                        If the context doesn't contain relevant information, say so.";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_render_prompt_keeps_question_verbatim() {
        let prompt = render_prompt("  spaced?  ", "ctx");
        assert!(prompt.contains("Question:   spaced?  \n\n"));
    }
}
