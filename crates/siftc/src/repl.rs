//! Interactive session: type queries against a root record and run them
//! over a JSON row.

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use sift::json::{from_json_str, to_json};
use sift::{diagnostics, Engine, Schema, Type, Value};
use sift_lexer::Lexer;
use sift_typeck::render_typed;

use crate::resolve_root;

const PROMPT: &str = "sift> ";

/// One line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Root(String),
    Type(String),
    Fmt(String),
    Data(String),
    Tokens(String),
    Query(String),
    Empty,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(meta) = line.strip_prefix(':') else {
        return Ok(Command::Query(line.to_string()));
    };
    let (name, rest) = match meta.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (meta, ""),
    };
    let argument = |build: fn(String) -> Command| {
        if rest.is_empty() {
            Err(format!(":{name} needs an argument"))
        } else {
            Ok(build(rest.to_string()))
        }
    };
    match name {
        "help" | "h" => Ok(Command::Help),
        "quit" | "q" => Ok(Command::Quit),
        "root" => argument(Command::Root),
        "type" | "t" => argument(Command::Type),
        "fmt" => argument(Command::Fmt),
        "data" => argument(Command::Data),
        "tokens" => argument(Command::Tokens),
        other => Err(format!("unknown command `:{other}`, try :help")),
    }
}

const HELP: &str = "\
Commands:
  <query>          Type-check a query, or evaluate it if :data is set
  :type <query>    Show the typed tree
  :fmt <query>     Show the canonical form
  :tokens <query>  Show the token stream
  :root <record>   Check queries against another schema record
  :data <json>     Set the row queries are evaluated on
  :help            Show this help
  :quit            Exit";

pub struct Session<'a> {
    engine: &'a Engine,
    schema: Option<Schema>,
    root: Option<Type>,
    data: Option<Value>,
}

impl<'a> Session<'a> {
    pub fn new(engine: &'a Engine, schema: Option<Schema>) -> Self {
        let root = schema.as_ref().and_then(|s| s.root().ok());
        Session {
            engine,
            schema,
            root,
            data: None,
        }
    }

    fn root(&self) -> Result<&Type, String> {
        self.root
            .as_ref()
            .ok_or_else(|| "no root record; start with --schema and use :root".to_string())
    }

    /// Run one command. `Ok(None)` means there is nothing to print.
    pub fn handle(&mut self, command: Command) -> Result<Option<String>, String> {
        match command {
            Command::Empty | Command::Quit => Ok(None),
            Command::Help => Ok(Some(HELP.to_string())),
            Command::Root(name) => {
                let schema = self.schema.as_ref().ok_or("no schema loaded")?;
                let root = resolve_root(schema, Some(&name))?;
                let shown = root.to_string();
                self.root = Some(root);
                // Rows of the previous root no longer fit.
                self.data = None;
                Ok(Some(format!("root: {shown}")))
            }
            Command::Fmt(query) => self
                .engine
                .format(&query)
                .map(Some)
                .map_err(|e| diagnostics::render(&e)),
            Command::Tokens(query) => {
                let tokens = Lexer::tokenize(&query).map_err(|e| e.to_string())?;
                let lines: Vec<String> = tokens
                    .iter()
                    .map(|t| format!("{:?} {}..{}", t.kind, t.span.start, t.span.end))
                    .collect();
                Ok(Some(lines.join("\n")))
            }
            Command::Type(query) => {
                let typed = self
                    .engine
                    .check(&query, self.root()?)
                    .map_err(|e| diagnostics::render(&e))?;
                Ok(Some(render_typed(&typed).trim_end().to_string()))
            }
            Command::Data(json) => {
                let value = from_json_str(&json, self.root()?).map_err(|e| e.to_string())?;
                self.data = Some(value);
                Ok(Some("data set".to_string()))
            }
            Command::Query(query) => {
                let root = self.root()?;
                match &self.data {
                    Some(row) => self
                        .engine
                        .evaluate(&query, root, row.clone())
                        .map(|value| Some(to_json(&value).to_string()))
                        .map_err(|e| diagnostics::render(&e)),
                    None => self
                        .engine
                        .check(&query, root)
                        .map(|typed| Some(format!(": {}", typed.ann.ty)))
                        .map_err(|e| diagnostics::render(&e)),
                }
            }
        }
    }
}

pub fn run(engine: &Engine, schema: Option<Schema>, root: Option<&str>) -> Result<(), String> {
    let mut session = Session::new(engine, schema);
    if let Some(name) = root {
        session.handle(Command::Root(name.to_string()))?;
    }

    println!("siftc {} - Sift query REPL", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit\n");

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> =
        Editor::with_config(config).map_err(|e| format!("failed to create editor: {e}"))?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(msg) => {
                        eprintln!("{msg}");
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                match session.handle(command) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(msg) => eprintln!("{}", msg.trim_end()),
                }
            }
            Err(ReadlineError::Interrupted) => println!("Use :quit or Ctrl-D to exit"),
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(format!("readline failed: {err}")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
root = "Order"

[types.Order]
num = "int"
str = "string"

[types.Item]
qty = "int"
"#;

    fn session(engine: &Engine) -> Session<'_> {
        Session::new(engine, Some(Schema::from_toml_str(SCHEMA).unwrap()))
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("   ").unwrap(), Command::Empty);
        assert_eq!(parse_command(":q").unwrap(), Command::Quit);
        assert_eq!(
            parse_command(":type  o => o.num").unwrap(),
            Command::Type("o => o.num".to_string())
        );
        assert_eq!(
            parse_command("o => o.num > 1").unwrap(),
            Command::Query("o => o.num > 1".to_string())
        );
        assert_eq!(parse_command(":root").unwrap_err(), ":root needs an argument");
        assert!(parse_command(":bogus").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn checks_then_evaluates() {
        let engine = Engine::default();
        let mut session = session(&engine);
        let shown = session.handle(Command::Query("o => o.num > 1".into())).unwrap();
        assert_eq!(shown.as_deref(), Some(": (Order) => bool"));

        session.handle(Command::Data(r#"{"num": 3, "str": "x"}"#.into())).unwrap();
        let shown = session.handle(Command::Query("o => o.num + 1".into())).unwrap();
        assert_eq!(shown.as_deref(), Some("4"));
    }

    #[test]
    fn switching_root_drops_data() {
        let engine = Engine::default();
        let mut session = session(&engine);
        session.handle(Command::Data(r#"{"num": 3}"#.into())).unwrap();
        assert_eq!(
            session.handle(Command::Root("item".into())).unwrap().as_deref(),
            Some("root: Item")
        );
        let shown = session.handle(Command::Query("i => i.qty".into())).unwrap();
        assert_eq!(shown.as_deref(), Some(": (Item) => int"));
        assert!(session.handle(Command::Root("Nope".into())).is_err());
    }

    #[test]
    fn errors_are_rendered() {
        let engine = Engine::default();
        let mut session = session(&engine);
        let err = session.handle(Command::Query("o => o.missing".into())).unwrap_err();
        assert!(err.contains("has no member `missing`"), "{err}");
        assert_eq!(
            session.handle(Command::Fmt("x=>x.num+1".into())).unwrap().as_deref(),
            Some("x => x.num + 1")
        );
    }
}
