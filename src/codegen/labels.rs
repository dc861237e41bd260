use log::trace;
use std::fmt::{self, Display};

/// Destino de salto.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Label(id) = self;
        write!(fmt, ".lbl{}", id)
    }
}

/// Asignador de etiquetas.
///
/// Los identificadores empiezan en 1 y nunca se reutilizan dentro de una
/// misma compilación, ya que las etiquetas son textuales y una colisión
/// uniría dos destinos de salto distintos.
#[derive(Debug)]
pub struct Labels {
    next: u32,
}

impl Labels {
    pub fn new() -> Self {
        Labels { next: 1 }
    }

    /// Reserva la siguiente etiqueta.
    pub fn next(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;

        trace!("Allocated label {}", label);
        label
    }

    /// Cantidad de etiquetas reservadas hasta el momento.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }
}

impl Default for Labels {
    fn default() -> Self {
        Labels::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one_and_increases() {
        let mut labels = Labels::new();
        assert_eq!(labels.allocated(), 0);

        let first = labels.next();
        let second = labels.next();
        let third = labels.next();

        assert_eq!(first, Label(1));
        assert!(first < second && second < third);
        assert_eq!(labels.allocated(), 3);
    }

    #[test]
    fn fresh_allocators_are_independent() {
        let mut one = Labels::new();
        one.next();
        one.next();

        assert_eq!(Labels::default().next(), Label(1));
    }

    #[test]
    fn display_as_local_symbol() {
        assert_eq!(Label(12).to_string(), ".lbl12");
    }
}
