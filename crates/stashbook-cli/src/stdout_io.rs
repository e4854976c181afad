use std::io::{self, Write};

/// Help and version text already end with a newline; rendered output does not.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Ending {
    AsIs,
    Newline,
}

/// Writes to stdout. A reader that hangs up early (`stashbook import list | head -1`)
/// ends the write quietly instead of failing the command.
pub fn emit(text: &str, ending: Ending) -> io::Result<()> {
    emit_to(&mut io::stdout().lock(), text, ending)
}

fn emit_to(out: &mut impl Write, text: &str, ending: Ending) -> io::Result<()> {
    match write_flushed(out, text, ending) {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn write_flushed(out: &mut impl Write, text: &str, ending: Ending) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if ending == Ending::Newline {
        out.write_all(b"\n")?;
    }
    out.flush()
}
