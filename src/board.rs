//! Registro de variables de la tarjeta.
//!
//! Cada variable del lenguaje fuente corresponde a uno o más bits de un
//! puerto de E/S mapeado en memoria. Este registro asocia nombres simbólicos
//! con esos puertos y lleva cuenta de cuáles variables fueron accedidas por
//! el programa, lo cual determina qué puertos se configuran en el prólogo.

use bitflags::bitflags;
use thiserror::Error;

use std::{
    collections::HashMap,
    fmt::{self, Display},
};

/// Puerto de E/S de propósito general.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Port {
    /// Todos los puertos, en orden.
    pub const ALL: &'static [Port] = &[
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::G,
    ];

    fn flag(self) -> Ports {
        match self {
            Port::A => Ports::A,
            Port::B => Ports::B,
            Port::C => Ports::C,
            Port::D => Ports::D,
            Port::E => Ports::E,
            Port::F => Ports::F,
            Port::G => Ports::G,
        }
    }
}

impl Display for Port {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Port::A => "A",
            Port::B => "B",
            Port::C => "C",
            Port::D => "D",
            Port::E => "E",
            Port::F => "F",
            Port::G => "G",
        };

        fmt.write_str(letter)
    }
}

bitflags! {
    /// Conjunto de puertos.
    pub struct Ports: u8 {
        const A = 0x01;
        const B = 0x02;
        const C = 0x04;
        const D = 0x08;
        const E = 0x10;
        const F = 0x20;
        const G = 0x40;
    }
}

impl Ports {
    /// Enumera los puertos del conjunto en orden.
    pub fn iter(self) -> impl Iterator<Item = Port> {
        Port::ALL
            .iter()
            .copied()
            .filter(move |port| self.contains(port.flag()))
    }
}

impl From<Port> for Ports {
    fn from(port: Port) -> Self {
        port.flag()
    }
}

/// Dirección de un pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Asociación entre una variable y bits de un puerto.
#[derive(Clone, Debug)]
pub struct PortBinding {
    name: String,
    port: Port,
    mask: u32,
    direction: Direction,
    accessed: bool,
}

impl PortBinding {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Indica si alguna referencia del programa apunta a esta variable.
    pub fn accessed(&self) -> bool {
        self.accessed
    }
}

/// Identificador de una variable dentro de un [`Registry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VarId(u32);

/// Error de construcción o consulta del registro.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Variable `{0}` is already defined")]
    Duplicate(String),

    #[error("Variable `{0}` is undefined")]
    NotFound(String),
}

/// Asignación fija de variables a puertos de la tarjeta.
///
/// LEDs en el puerto A, interruptores repartidos entre los puertos
/// B, D y F, y el LED RGB en el puerto D.
const BOARD: &[(&str, Port, u32, Direction)] = &[
    ("LD0", Port::A, 0x1, Direction::Output),
    ("LD1", Port::A, 0x2, Direction::Output),
    ("LD2", Port::A, 0x4, Direction::Output),
    ("LD3", Port::A, 0x8, Direction::Output),
    ("LD4", Port::A, 0x10, Direction::Output),
    ("LD5", Port::A, 0x20, Direction::Output),
    ("LD6", Port::A, 0x40, Direction::Output),
    ("LD7", Port::A, 0x80, Direction::Output),
    ("SW0", Port::F, 0x8, Direction::Input),
    ("SW1", Port::F, 0x20, Direction::Input),
    ("SW2", Port::F, 0x10, Direction::Input),
    ("SW3", Port::D, 0x8000, Direction::Input),
    ("SW4", Port::D, 0x4000, Direction::Input),
    ("SW5", Port::B, 0x800, Direction::Input),
    ("SW6", Port::B, 0x400, Direction::Input),
    ("SW7", Port::B, 0x200, Direction::Input),
    ("R", Port::D, 0x4, Direction::Output),
    ("G", Port::D, 0x1000, Direction::Output),
    ("B", Port::D, 0x8, Direction::Output),
];

/// Tabla de variables.
///
/// Cada compilación debe construir su propio registro, ya que las marcas
/// de acceso son parte del estado de la compilación.
#[derive(Default, Debug)]
pub struct Registry {
    bindings: Vec<PortBinding>,
    names: HashMap<String, VarId>,
}

impl Registry {
    /// Construye un registro vacío.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Construye el registro con las variables fijas de la tarjeta.
    pub fn board() -> Self {
        let mut registry = Registry::new();
        for &(name, port, mask, direction) in BOARD {
            // Los nombres de la tabla son distintos entre sí
            registry.insert(name, port, mask, direction);
        }

        registry
    }

    /// Define una nueva variable.
    pub fn define(
        &mut self,
        name: &str,
        port: Port,
        mask: u32,
        direction: Direction,
    ) -> Result<VarId, RegistryError> {
        if self.names.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_owned()));
        }

        Ok(self.insert(name, port, mask, direction))
    }

    /// Busca una variable por nombre. Los nombres distinguen mayúsculas.
    pub fn lookup(&self, name: &str) -> Result<VarId, RegistryError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    /// Obtiene la asociación de una variable.
    pub fn get(&self, VarId(id): VarId) -> Option<&PortBinding> {
        self.bindings.get(id as usize)
    }

    /// Marca una variable como accedida.
    pub fn mark_accessed(&mut self, VarId(id): VarId) {
        if let Some(binding) = self.bindings.get_mut(id as usize) {
            binding.accessed = true;
        }
    }

    /// Itera sobre las variables en orden de definición.
    pub fn iter(&self) -> impl Iterator<Item = &PortBinding> {
        self.bindings.iter()
    }

    /// Puertos en los que existe al menos una variable.
    pub fn ports(&self) -> Ports {
        self.bindings
            .iter()
            .fold(Ports::empty(), |ports, binding| ports | Ports::from(binding.port))
    }

    fn insert(&mut self, name: &str, port: Port, mask: u32, direction: Direction) -> VarId {
        let id = VarId(self.bindings.len() as u32);
        self.bindings.push(PortBinding {
            name: name.to_owned(),
            port,
            mask,
            direction,
            accessed: false,
        });

        self.names.insert(name.to_owned(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_resolves_fixed_bindings() {
        let registry = Registry::board();

        let sw3 = registry.lookup("SW3").unwrap();
        let sw3 = registry.get(sw3).unwrap();
        assert_eq!(sw3.port(), Port::D);
        assert_eq!(sw3.mask(), 0x8000);
        assert_eq!(sw3.direction(), Direction::Input);
        assert!(!sw3.accessed());

        let ld7 = registry.get(registry.lookup("LD7").unwrap()).unwrap();
        assert_eq!((ld7.port(), ld7.mask()), (Port::A, 0x80));
        assert_eq!(ld7.direction(), Direction::Output);

        assert_eq!(registry.iter().count(), 19);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = Registry::board();

        assert!(registry.lookup("B").is_ok());
        assert_eq!(
            registry.lookup("ld0"),
            Err(RegistryError::NotFound(String::from("ld0")))
        );
    }

    #[test]
    fn define_rejects_duplicate_names() {
        let mut registry = Registry::new();
        let led = registry
            .define("LED", Port::C, 0x2, Direction::Output)
            .unwrap();

        assert_eq!(
            registry.define("LED", Port::E, 0x1, Direction::Input),
            Err(RegistryError::Duplicate(String::from("LED")))
        );

        assert_eq!(registry.lookup("LED"), Ok(led));
        assert_eq!(registry.get(led).unwrap().port(), Port::C);
    }

    #[test]
    fn board_ports_in_order() {
        let ports: Vec<_> = Registry::board().ports().iter().collect();
        assert_eq!(ports, vec![Port::A, Port::B, Port::D, Port::F]);
    }

    #[test]
    fn mark_accessed_only_touches_one_binding() {
        let mut registry = Registry::board();
        let sw0 = registry.lookup("SW0").unwrap();
        registry.mark_accessed(sw0);

        let accessed: Vec<_> = registry
            .iter()
            .filter(|binding| binding.accessed())
            .map(PortBinding::name)
            .collect();

        assert_eq!(accessed, vec!["SW0"]);
    }
}
