//! Compilador de programas de E/S digital para tarjetas PIC32MX.
//!
//! # Front end
//! El análisis léxico y sintáctico es externo a este crate. Un front end
//! entrega un árbol sintáctico ([`ast::Node`]) cuyas referencias a
//! variables ya fueron resueltas contra el registro de variables de la
//! tarjeta, descrito en [`board`].
//!
//! # Back end
//! Es aquí donde el compilador deja de ser agnóstico a la tarjeta. En
//! [`target`] el árbol se recorre en varias pasadas: primero se marcan las
//! variables accedidas, luego se emite un prólogo que configura los puertos
//! correspondientes, después se traduce el cuerpo del programa y finalmente
//! se emite un epílogo con un ciclo de detención y las palabras de
//! configuración de la tarjeta. El resultado es código ensamblador MIPS que
//! debe ensamblarse y enlazarse con la toolchain del fabricante.

#[macro_use]
mod macros;

pub mod ast;
pub mod board;
pub mod error;
pub mod logger;

mod arch;
mod codegen;

/// Emisión de código.
///
/// Este módulo reexporta suficientes ítems internos relacionados a generación de código para
/// traducir un árbol sintáctico a ensamblador de la tarjeta.
pub mod target {
    pub use crate::arch::{Emitter, Pic32};
    pub use crate::codegen::{emit, emit_with, Label, Labels};
}
