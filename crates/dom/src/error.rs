use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("XML write error: {0}")]
    Write(String),
}
