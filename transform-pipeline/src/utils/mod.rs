pub mod csv_export;
pub mod file_text_extraction;
pub mod llm_instructions;
