//! Detalles específicos para cada arquitectura objetivo.
//!
//! Este módulo expone la interfaz de emisión de código que el traductor
//! agnóstico de [`crate::codegen`] utiliza. Las implementaciones viven en
//! sus propios submódulos; por ahora solo existe la de PIC32MX.

use crate::{board::Port, codegen::Label};
use std::{fmt, io};

mod mips;

pub use mips::Emitter as Pic32;

/// Emisión de código ensamblador para una tarjeta.
///
/// Los tipos que implementan este trait traducen operaciones primitivas
/// sobre puertos y saltos a instrucciones de la arquitectura objetivo.
pub trait Emitter {
    /// Encabezado fijo del listado, antes de cualquier otra instrucción.
    fn preamble(&mut self) -> io::Result<()>;

    /// Configura todos los pines de un puerto como digitales.
    fn digital_mode(&mut self, port: Port) -> io::Result<()>;

    /// Configura los pines de `mask` como entradas o salidas.
    fn set_direction(&mut self, port: Port, mask: u32, input: bool) -> io::Result<()>;

    /// Separa y describe el inicio de una sentencia.
    fn statement(&mut self, description: fmt::Arguments<'_>) -> io::Result<()>;

    /// Enciende (`high`) o apaga los pines de `mask`.
    fn write_port(&mut self, port: Port, mask: u32, high: bool) -> io::Result<()>;

    /// Lee un puerto y conserva únicamente los bits de `mask`.
    ///
    /// El resultado queda disponible para [`Emitter::branch_if_set()`].
    fn test_port(&mut self, port: Port, mask: u32) -> io::Result<()>;

    /// Saltar a una etiqueta si la última prueba fue distinta de cero.
    fn branch_if_set(&mut self, label: Label) -> io::Result<()>;

    /// Saltar incondicionalmente a una etiqueta.
    fn jump(&mut self, label: Label) -> io::Result<()>;

    /// Coloca una etiqueta en la posición actual.
    fn set_label(&mut self, label: Label) -> io::Result<()>;

    /// Espera activa de `count` iteraciones, usando `label` como ciclo.
    fn countdown(&mut self, count: u32, label: Label) -> io::Result<()>;

    /// Emite el final del listado, después del ciclo de detención.
    fn epilogue(&mut self) -> io::Result<()>;
}
