mod typst;

pub use typst::{compile_pdf, compile_pdf_bytes, typst_source, TypstSource};
