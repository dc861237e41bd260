//! Implementación para PIC32MX (MIPS32 M4K).
//!
//! # Registros de E/S
//! Cada puerto `x` expone `PORTx` para lectura, `LATx` para escritura,
//! `TRISx` para dirección y `ANSELx` para el modo analógico. `LATx` y
//! `TRISx` tienen alias atómicos `SET`/`CLR` que afectan únicamente los
//! bits en uno de la palabra escrita, lo cual evita ciclos de
//! lectura-modificación-escritura.
//!
//! Se emite con `.set noreorder`, por lo cual cada salto lleva un `nop`
//! explícito en su delay slot.

use crate::{board::Port, codegen::Label};
use std::{
    fmt,
    io::{self, Write},
};

/// Registro de procesador.
#[derive(Copy, Clone, PartialEq, Eq)]
struct Reg(u8);

impl Reg {
    /// Constante cero cableada.
    const ZERO: Reg = Reg(0);

    /// Parte alta de la dirección de un registro de E/S.
    const ADDRESS: Reg = Reg(8);

    /// Valor leído o por escribir.
    const VALUE: Reg = Reg(9);

    /// Contador de espera activa.
    const COUNTER: Reg = Reg(10);
}

impl fmt::Display for Reg {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Reg(number) = self;
        write!(formatter, "${}", number)
    }
}

/// Palabras de configuración de la tarjeta (fuses), tal cual.
const CONFIG_WORDS: &[&str] = &[
    "\t.section\t.config_BFC02FFC, code, keep, address(0xBFC02FFC) \n\t.word\t0x7FFFFFFB \n",
    "\t.section\t.config_BFC02FF8, code, keep, address(0xBFC02FF8)\n\t.word\t0xFF74FD5B \n",
    "\t.section\t.config_BFC02FF4, code, keep, address(0xBFC02FF4) \n\t.word\t0xFFF8FFD9 \n",
    "\t.section\t.config_BFC02FF0, code, keep, address(0xBFC02FF0) \n\t.word\t0xCFFFFFFF\n",
];

/// Implementación de emisión de código para PIC32MX.
pub struct Emitter<'a, W> {
    output: &'a mut W,
}

impl<'a, W: Write> Emitter<'a, W> {
    pub fn new(output: &'a mut W) -> Self {
        Emitter { output }
    }

    fn output(&mut self) -> &mut W {
        &mut *self.output
    }

    /// Escribe `mask` en un registro de E/S.
    fn store_mask(&mut self, register: fmt::Arguments<'_>, mask: u32) -> io::Result<()> {
        let register = register.to_string();

        emit!(self, "lui", "{},%hi({})", Reg::ADDRESS, register)?;
        emit!(self, "li", "{},{:#x}", Reg::VALUE, mask)?;
        emit!(
            self,
            "sw",
            "{},%lo({})({})",
            Reg::VALUE,
            register,
            Reg::ADDRESS
        )
    }
}

impl<W: Write> super::Emitter for Emitter<'_, W> {
    fn preamble(&mut self) -> io::Result<()> {
        for directive in &[".global main", ".text", ".set noreorder", ".ent main"] {
            emit!(self, directive)?;
        }

        writeln!(self.output(), "main:")
    }

    fn digital_mode(&mut self, port: Port) -> io::Result<()> {
        writeln!(self.output(), "\t# configure PORT{} as digital", port)?;
        emit!(self, "lui", "{},%hi(ANSEL{})", Reg::ADDRESS, port)?;
        emit!(
            self,
            "sw",
            "{},%lo(ANSEL{})({})",
            Reg::ZERO,
            port,
            Reg::ADDRESS
        )
    }

    fn set_direction(&mut self, port: Port, mask: u32, input: bool) -> io::Result<()> {
        // Un uno en TRIS configura el pin como entrada
        let alias = if input { "SET" } else { "CLR" };
        self.store_mask(format_args!("TRIS{}{}", port, alias), mask)
    }

    fn statement(&mut self, description: fmt::Arguments<'_>) -> io::Result<()> {
        writeln!(self.output(), "\t")?;
        writeln!(self.output(), "\t# {}", description)
    }

    fn write_port(&mut self, port: Port, mask: u32, high: bool) -> io::Result<()> {
        let alias = if high { "SET" } else { "CLR" };
        self.store_mask(format_args!("LAT{}{}", port, alias), mask)
    }

    fn test_port(&mut self, port: Port, mask: u32) -> io::Result<()> {
        emit!(self, "lui", "{},%hi(PORT{})", Reg::ADDRESS, port)?;
        emit!(
            self,
            "lw",
            "{},%lo(PORT{})({})",
            Reg::VALUE,
            port,
            Reg::ADDRESS
        )?;

        emit!(self, "andi", "{0},{0},{1:#x}", Reg::VALUE, mask)
    }

    fn branch_if_set(&mut self, label: Label) -> io::Result<()> {
        emit!(self, "bne", "{},{},{}", Reg::VALUE, Reg::ZERO, label)?;
        emit!(self, "nop")
    }

    fn jump(&mut self, label: Label) -> io::Result<()> {
        emit!(self, "j", "{}", label)?;
        emit!(self, "nop")
    }

    fn set_label(&mut self, label: Label) -> io::Result<()> {
        writeln!(self.output(), "{}:", label)
    }

    fn countdown(&mut self, count: u32, label: Label) -> io::Result<()> {
        emit!(self, "li", "{},{:#x}", Reg::COUNTER, count)?;
        self.set_label(label)?;
        emit!(self, "addi", "{0},{0},-1", Reg::COUNTER)?;
        emit!(self, "bne", "{},{},{}", Reg::COUNTER, Reg::ZERO, label)?;
        emit!(self, "nop")
    }

    fn epilogue(&mut self) -> io::Result<()> {
        writeln!(self.output(), "\t")?;
        emit!(self, ".end", "main")?;
        writeln!(self.output(), "\t")?;

        for section in CONFIG_WORDS {
            self.output().write_all(section.as_bytes())?;
        }

        Ok(())
    }
}
