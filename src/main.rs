use std::process::ExitCode;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use minirel::{Database, QueryOutput, Value};

const PROMPT: &str = "minirel> ";

fn print_help() {
    println!("Statements:");
    println!("  CREATE TABLE t (col INT|VARCHAR [NOT NULL] [PRIMARY KEY] [AUTOINCREMENT] [UNIQUE], ...)");
    println!("  INSERT INTO t [(col, ...)] VALUES (v, ...), ...");
    println!("  SELECT * | col, ... FROM t [WHERE expr] [ORDER BY col [ASC|DESC]] [LIMIT n [OFFSET m]]");
    println!("  UPDATE t SET col = v, ... [WHERE expr]");
    println!("  DELETE FROM t [WHERE expr]");
    println!();
    println!("Commands:");
    println!("  tables        list tables");
    println!("  help          show this message");
    println!("  exit | quit   flush and leave");
}

fn print_output(output: QueryOutput) {
    match output {
        QueryOutput::Count(n) => println!("OK, {n} row(s) affected"),
        QueryOutput::Rows { columns, rows } => {
            println!("{}", columns.join(" | "));
            for row in &rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|value| match value {
                        Value::Null => "NULL".to_string(),
                        other => other.to_string(),
                    })
                    .collect();
                println!("{}", cells.join(" | "));
            }
            println!("{} row(s)", rows.len());
        }
    }
}

fn repl(db: &Database) -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                editor.add_history_entry(input)?;

                match input.to_ascii_lowercase().as_str() {
                    "exit" | "quit" => break,
                    "help" => {
                        print_help();
                        continue;
                    }
                    "tables" => {
                        match db.catalog().table_names() {
                            Ok(names) => {
                                for name in names {
                                    println!("{name}");
                                }
                            }
                            Err(e) => eprintln!("error: {e}"),
                        }
                        continue;
                    }
                    _ => {}
                }

                match db.execute(input) {
                    Ok(output) => print_output(output),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let path = std::env::args().nth(1).unwrap_or_else(|| "minirel.db".to_string());

    let db = match Database::open(&path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("minirel - type 'help' for usage, 'exit' to leave");
    println!("database: {path}");

    if let Err(e) = repl(&db) {
        eprintln!("readline error: {e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = db.close() {
        eprintln!("failed to flush {path}: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
