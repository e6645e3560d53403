use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use codespan_reporting::term::{self, Config, DisplayStyle};

use decaf_frontend::ParseError;

/// Print a parse error together with the source line it points at.
pub(super) fn print_parse_error(
    name: String,
    src: String,
    error: &ParseError,
) -> anyhow::Result<()> {
    let mut writer = StandardStream::stderr(ColorChoice::Auto);
    write_parse_error(&mut writer, name, src, error)
}

pub(super) fn write_parse_error(
    writer: &mut dyn WriteColor,
    name: String,
    src: String,
    error: &ParseError,
) -> anyhow::Result<()> {
    let mut files = SimpleFiles::new();
    let file = files.add(name, src);

    let diagnostic = Diagnostic::error()
        .with_message(&error.message)
        .with_labels(vec![Label::primary(file, error.span.start..error.span.end)]);

    let config = Config {
        display_style: DisplayStyle::Rich,
        ..Default::default()
    };

    term::emit(writer, &config, &files, &diagnostic)?;
    Ok(())
}
