//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación y expone una CLI.

use anyhow::{self, Context};
use clap::{self, crate_version, Arg};
use pic32c::{ast::Node, board::Registry, logger, target};

use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = cli().get_matches();

    logger::configure(args.occurrences_of("verbose")).map_err(anyhow::Error::msg)?;

    let mut registry = Registry::board();
    let program = test_program(&registry)?;

    if args.is_present("tree") {
        eprint!("{}", program.dump(&registry));
    }

    let output = args.value_of("output").unwrap_or("prog.s");
    let diagnostics = match output {
        // Salida a stdout
        "-" => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();

            target::emit(&program, &mut registry, &mut stdout)
                .context("Failed to emit to stdout")?
        }

        // Salida a archivo
        path => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            let mut file = BufWriter::new(file);
            let diagnostics = target::emit(&program, &mut registry, &mut file)
                .with_context(|| format!("Failed to emit to file: {}", path))?;

            file.flush()
                .with_context(|| format!("Failed to emit to file: {}", path))?;

            diagnostics
        }
    };

    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics);
    }

    Ok(())
}

fn cli() -> clap::Command<'static> {
    clap::Command::new("PIC32 I/O compiler")
        .version(crate_version!())
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("prog.s")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("tree")
                .long("tree")
                .help("Print the syntax tree to stderr"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase log verbosity"),
        )
}

fn test_program(registry: &Registry) -> anyhow::Result<Node> {
    // Este es un programa de prueba para mientras no se haya conectado
    // un front end que produzca árboles a partir de código fuente.

    let var = |name: &str| -> anyhow::Result<Node> { Ok(Node::var(Some(registry.lookup(name)?))) };

    let blink = |level| -> anyhow::Result<Vec<Node>> {
        Ok(vec![
            Node::assign(Node::Const(level), var("R")?),
            Node::delay(Node::Const(1_000_000)),
        ])
    };

    let mut body = vec![
        Node::when(
            var("SW0")?,
            Node::Block(vec![Node::assign(Node::Const(1), var("LD0")?)]),
            Some(Node::Block(vec![Node::assign(Node::Const(0), var("LD0")?)])),
        ),
        Node::assign(var("SW1")?, var("LD1")?),
    ];

    body.extend(blink(1)?);
    body.extend(blink(0)?);

    Ok(Node::Block(vec![Node::repeat(Node::Block(body))]))
}
