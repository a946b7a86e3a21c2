//! Default I/O verb hooks.
//!
//! The core language has no filesystem access; [`install`] registers the
//! conventional hooks on an interpreter:
//!
//! - `0:` reads a text file as a list of lines (a directory lists its
//!   entries); `path 0: lines` writes lines to a file
//! - `1:` reads and writes JSON (feature `json`)
//! - `5:` returns the printable form of any value as a string
//!
//! An empty path (`` ` `` or `""`) reads one line from stdin or writes to
//! stdout.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::Error;
use crate::evaluator::Interpreter;
use crate::printer;
use crate::value::Value;
use crate::verbs::Slot;

const MONADS: [Slot; 2] = [Slot::AtomMonad, Slot::ListMonad];
const DYADS: [Slot; 4] = [Slot::AtomAtom, Slot::ListAtom, Slot::AtomList, Slot::ListList];

/// Register `0:`, `1:` and `5:` on `interp`
pub fn install(interp: &mut Interpreter) -> Result<(), Error> {
    for slot in MONADS {
        interp.set_io("0:", slot, |_, args, _| read_lines(single(args)?))?;
        interp.set_io("5:", slot, |_, args, _| {
            Ok(Value::from(printer::format(single(args)?, false)))
        })?;
        #[cfg(feature = "json")]
        interp.set_io("1:", slot, |_, args, _| read_json(single(args)?))?;
    }
    for slot in DYADS {
        interp.set_io("0:", slot, |_, args, _| {
            let (path, data) = pair(args)?;
            write_text(path, &lines_text(data)?)?;
            Ok(data.clone())
        })?;
        #[cfg(feature = "json")]
        interp.set_io("1:", slot, |_, args, _| {
            let (path, data) = pair(args)?;
            let json = crate::convert::to_json(data)?;
            write_text(path, &json.to_string())?;
            Ok(data.clone())
        })?;
    }
    Ok(())
}

fn single(args: &[Value]) -> Result<&Value, Error> {
    match args {
        [x] => Ok(x),
        _ => Err(Error::Valence),
    }
}

fn pair(args: &[Value]) -> Result<(&Value, &Value), Error> {
    match args {
        [x, y] => Ok((x, y)),
        _ => Err(Error::Valence),
    }
}

/// A path named by a string or symbol
fn path_text(x: &Value) -> Result<String, Error> {
    match x {
        Value::Symbol(s) => Ok(s.clone()),
        Value::List(items) if items.is_empty() => Ok(String::new()),
        other => other.text(),
    }
}

fn io_error(action: &str, path: &str, e: std::io::Error) -> Error {
    Error::Domain(format!("cannot {action} '{path}': {e}."))
}

fn read_text(x: &Value) -> Result<String, Error> {
    let path = path_text(x)?;
    if path.is_empty() {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| io_error("read", "stdin", e))?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_owned());
    }
    debug!(path, "reading file");
    fs::read_to_string(&path).map_err(|e| io_error("read", &path, e))
}

fn read_lines(x: &Value) -> Result<Value, Error> {
    let path = path_text(x)?;
    if !path.is_empty() && Path::new(&path).is_dir() {
        let mut names = fs::read_dir(&path)
            .map_err(|e| io_error("list", &path, e))?
            .map(|entry| {
                entry
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .map_err(|e| io_error("list", &path, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        names.sort();
        return Ok(Value::List(names.into_iter().map(Value::from).collect()));
    }
    let text = read_text(x)?;
    let body = text.strip_suffix('\n').unwrap_or(&text);
    let body = body.strip_suffix('\r').unwrap_or(body);
    Ok(Value::List(
        body.split('\n')
            .map(|line| Value::from(line.strip_suffix('\r').unwrap_or(line)))
            .collect(),
    ))
}

#[cfg(feature = "json")]
fn read_json(x: &Value) -> Result<Value, Error> {
    crate::convert::parse_json(&read_text(x)?)
}

/// A string as is; a list of strings joined with trailing newlines
fn lines_text(data: &Value) -> Result<String, Error> {
    match data {
        Value::List(items) if !data.is_string() => {
            let mut out = String::new();
            for line in items {
                out.push_str(&line.text()?);
                out.push('\n');
            }
            Ok(out)
        }
        other => other.text(),
    }
}

fn write_text(x: &Value, text: &str) -> Result<(), Error> {
    let path = path_text(x)?;
    if path.is_empty() {
        let mut stdout = std::io::stdout().lock();
        return stdout
            .write_all(text.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| io_error("write", "stdout", e));
    }
    debug!(path, bytes = text.len(), "writing file");
    fs::write(&path, text).map_err(|e| io_error("write", &path, e))
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn interpreter() -> Interpreter {
        let mut interp = Interpreter::new();
        install(&mut interp).unwrap();
        interp
    }

    fn quoted(path: &Path) -> String {
        format!("\"{}\"", path.display())
    }

    #[test]
    fn test_printable_form() {
        let interp = interpreter();
        assert_eq!(interp.eval("5:1 2").unwrap().to_string(), "\"1 2\"");
        assert_eq!(interp.eval("5:`a").unwrap().to_string(), "\"`a\"");
        assert_eq!(interp.eval("5:\"hi\"").unwrap().to_string(), "\"\\\"hi\\\"\"");
    }

    #[test]
    fn test_text_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lines.txt");
        let interp = interpreter();

        let written = interp
            .eval(&format!("{} 0:(\"ab\";\"cd\")", quoted(&file)))
            .unwrap();
        assert_eq!(written.to_string(), "(\"ab\"\n \"cd\")");
        assert_eq!(fs::read_to_string(&file).unwrap(), "ab\ncd\n");

        let read = interp.eval(&format!("0:{}", quoted(&file))).unwrap();
        assert_eq!(read.to_string(), "(\"ab\"\n \"cd\")");

        let listing = interp.eval(&format!("0:{}", quoted(dir.path()))).unwrap();
        assert_eq!(listing.to_string(), ",\"lines.txt\"");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        let err = interpreter()
            .eval(&format!("0:{}", quoted(&missing)))
            .unwrap_err();
        assert!(err.to_string().starts_with("cannot read"), "{err}");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.json");
        let interp = interpreter();

        interp
            .eval(&format!("{} 1:[a:1 2;b:\"x\"]", quoted(&file)))
            .unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), r#"{"a":[1.0,2.0],"b":"x"}"#);

        let read = interp.eval(&format!("1:{}", quoted(&file))).unwrap();
        assert_eq!(read.to_string(), "[a:1 2;b:,\"x\"]");
    }

    #[test]
    fn test_unregistered_without_install() {
        let interp = Interpreter::new();
        let err = interp.eval("5:1").unwrap_err();
        assert_eq!(err.to_string(), "invalid arguments to 5:");
    }
}
