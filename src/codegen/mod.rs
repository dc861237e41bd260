//! Generación de código.
//!
//! La emisión de un programa ocurre en pasadas explícitas:
//! 1. Se recorre el árbol y se marcan como accedidas las variables
//!    referenciadas.
//! 2. Se emite el prólogo: encabezado, modo digital para cada puerto de la
//!    tarjeta y dirección de cada variable accedida.
//! 3. Se traduce el cuerpo del programa.
//! 4. Se emite el epílogo: un ciclo de detención y las palabras de
//!    configuración de la tarjeta.
//!
//! El prólogo depende de las marcas de acceso, por lo cual la pasada 1
//! debe completarse antes de la 2.

use crate::{
    arch::{Emitter, Pic32},
    ast::Node,
    board::{Direction, PortBinding, Registry},
    error::{CodegenError, Diagnostics},
};

use log::{debug, warn};
use std::io::{self, Write};

mod labels;
mod translate;

pub use labels::{Label, Labels};

/// Emite un programa completo para PIC32MX.
///
/// Los errores de E/S abortan la emisión. Los errores locales a una
/// sentencia se acumulan en los [`Diagnostics`] retornados.
pub fn emit<W: Write>(
    root: &Node,
    registry: &mut Registry,
    output: &mut W,
) -> io::Result<Diagnostics> {
    emit_with(root, registry, Pic32::new(output))
}

/// Emite un programa completo por medio de un [`Emitter`] arbitrario.
pub fn emit_with<E: Emitter>(
    root: &Node,
    registry: &mut Registry,
    emitter: E,
) -> io::Result<Diagnostics> {
    debug!("Scanning tree for accessed variables");
    mark_accessed(root, registry);

    let mut cx = Context::new(emitter, registry);

    debug!("Emitting prologue");
    cx.prologue()?;

    debug!("Emitting program body");
    cx.translate(root)?;

    debug!("Emitting epilogue");
    cx.epilogue()?;

    debug!("Emission finished, {} labels", cx.labels.allocated());
    Ok(cx.diagnostics)
}

fn mark_accessed(root: &Node, registry: &mut Registry) {
    root.for_each_var(&mut |id| {
        if let Some(id) = id {
            registry.mark_accessed(id);
        }
    });
}

/// Estado de emisión de una compilación.
struct Context<'r, E> {
    emitter: E,
    registry: &'r Registry,
    labels: Labels,
    diagnostics: Diagnostics,
}

impl<'r, E: Emitter> Context<'r, E> {
    fn new(emitter: E, registry: &'r Registry) -> Self {
        Context {
            emitter,
            registry,
            labels: Labels::new(),
            diagnostics: Diagnostics::default().kind("warning"),
        }
    }

    fn prologue(&mut self) -> io::Result<()> {
        let registry = self.registry;
        self.emitter.preamble()?;

        for port in registry.ports().iter() {
            self.emitter.digital_mode(port)?;
        }

        for binding in registry.iter().filter(|binding| binding.accessed()) {
            self.emitter
                .statement(format_args!("initialize variable {}", binding.name()))?;

            let input = binding.direction() == Direction::Input;
            self.emitter
                .set_direction(binding.port(), binding.mask(), input)?;
        }

        Ok(())
    }

    fn epilogue(&mut self) -> io::Result<()> {
        // Detención permanente
        let halt = self.labels.next();
        self.emitter.set_label(halt)?;
        self.emitter.jump(halt)?;

        self.emitter.epilogue()
    }

    /// Resuelve un operando que debe ser una variable.
    ///
    /// Si no es posible, se reporta el error y la sentencia debe omitirse.
    fn variable(&mut self, operand: &Node, statement: &'static str) -> Option<&'r PortBinding> {
        let registry = self.registry;

        match operand {
            Node::Var(Some(id)) => match registry.get(*id) {
                Some(binding) => Some(binding),
                None => self.report(CodegenError::UndefinedVariable(statement)),
            },

            Node::Var(None) => self.report(CodegenError::UndefinedVariable(statement)),

            _ => self.report(CodegenError::UnexpectedOperand {
                statement,
                expected: "variable",
            }),
        }
    }

    fn report<T>(&mut self, error: CodegenError) -> Option<T> {
        warn!("{}, statement skipped", error);
        self.diagnostics.push(error);

        None
    }
}
