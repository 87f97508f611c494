use thiserror::Error;
use xmlflow_dom::XmlError;
use xmlflow_xpath::XPathError;

/// Errors surfaced by the formatter.
///
/// `TemplateParse` and `Path` abort component start-up; `Render` fails the
/// current message only, leaving the template and bindings intact for the
/// next one.
#[derive(Error, Debug)]
pub enum FormatterError {
    #[error("template is not well-formed XML: {0}")]
    TemplateParse(#[from] XmlError),

    #[error(transparent)]
    Path(#[from] XPathError),

    #[error("render failed: {0}")]
    Render(String),
}
