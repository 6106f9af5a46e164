use std::{
    fs,
    io::{self, Read, Write},
    process,
};

use anyhow::{anyhow, Context};
use clap::{App, Arg, ArgMatches};
use log::LevelFilter;

use kscope::{Lexer, OperatorSpec, OperatorTable, Parser};

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_source(file_name: Option<&str>) -> anyhow::Result<String> {
    match file_name {
        None | Some("-") => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            Ok(source)
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path)),
    }
}

fn operator_table(matches: &ArgMatches) -> anyhow::Result<OperatorTable> {
    let mut table = if matches.is_present("no-default-operators") {
        OperatorTable::empty()
    } else {
        OperatorTable::default()
    };
    if let Some(specs) = matches.values_of("operator") {
        let specs = specs
            .map(str::parse::<OperatorSpec>)
            .collect::<Result<Vec<_>, _>>()?;
        table.extend(specs);
    }
    log::info!("using {} operators", table.len());
    Ok(table)
}

/// print every item that parses to `out` and every error to `err`
fn parse_keep_going<I, W, E>(parser: &mut Parser<I>, out: &mut W, err: &mut E) -> anyhow::Result<()>
where
    I: Iterator<Item = char>,
    W: Write,
    E: Write,
{
    let (ast, errors) = parser.parse_program_recovering();
    for node in &ast {
        writeln!(out, "{}", node)?;
    }
    for error in &errors {
        writeln!(err, "error: {}", error)?;
    }
    if !errors.is_empty() {
        return Err(anyhow!("{} parse error(s)", errors.len()));
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let source = read_source(matches.value_of("FILE"))?;

    if matches.is_present("tokens") {
        for token in Lexer::from_source(&source) {
            println!("{}", token);
        }
        return Ok(());
    }

    let mut parser = Parser::from_source(&source, operator_table(matches)?);

    if matches.is_present("keep-going") {
        return parse_keep_going(&mut parser, &mut io::stdout(), &mut io::stderr());
    }

    let ast = parser.parse_program().context("failed to parse input")?;
    for node in &ast {
        println!("{}", node);
    }
    Ok(())
}

fn main() {
    let matches = App::new("kscope")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("FILE")
                .index(1)
                .required(false)
                .help("Source file, stdin when omitted or -"),
        )
        .arg(
            Arg::with_name("tokens")
                .short("t")
                .long("tokens")
                .help("Print the token stream instead of parsing"),
        )
        .arg(
            Arg::with_name("keep-going")
                .short("k")
                .long("keep-going")
                .help("Skip past parse errors and keep parsing"),
        )
        .arg(
            Arg::with_name("operator")
                .short("o")
                .long("operator")
                .value_name("OP=PRECEDENCE")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Add or override a binary operator precedence"),
        )
        .arg(
            Arg::with_name("no-default-operators")
                .long("no-default-operators")
                .help("Start from an empty operator table"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    if let Err(err) = run(&matches) {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keep_going(source: &str) -> (anyhow::Result<()>, String, String) {
        let mut parser = Parser::from_source(source, OperatorTable::default());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let res = parse_keep_going(&mut parser, &mut out, &mut err);
        (
            res,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn keep_going_reports_every_error() {
        let (res, out, err) = keep_going("def ok() 1; +; foo(1 2; ok()");
        assert_eq!(out, "def ok() 1\n(ok)\n");
        assert_eq!(
            err,
            "error: unknown token '+' when expecting an expression\n\
             error: expected ')' or ',' in argument list but found number 2\n"
        );
        assert_eq!(res.unwrap_err().to_string(), "2 parse error(s)");
    }

    #[test]
    fn keep_going_succeeds_on_clean_input() {
        let (res, out, err) = keep_going("extern sin(x); sin(1)");
        assert!(res.is_ok());
        assert_eq!(out, "extern sin(x)\n(sin 1)\n");
        assert_eq!(err, "");
    }
}
