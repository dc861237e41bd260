//! Árbol sintáctico.
//!
//! El front end construye un [`Node`] raíz, normalmente un bloque, con las
//! referencias a variables ya resueltas contra el [`Registry`]. Una
//! referencia no resuelta se representa como `Var(None)`; el generador de
//! código la reporta y omite la sentencia que la contiene.

use crate::board::{Registry, VarId};
use std::fmt::{self, Display};

/// Nodo del árbol sintáctico.
///
/// La aridad de cada variante está fijada por su forma. `Const` y `Var`
/// solo tienen sentido como operandos de otras sentencias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Constante entera.
    Const(i32),

    /// Referencia a una variable de la tarjeta.
    Var(Option<VarId>),

    /// Secuencia de sentencias.
    Block(Vec<Node>),

    /// `target = source`, donde `source` es una constante o una entrada.
    Assign { source: Box<Node>, target: Box<Node> },

    /// Repetición infinita.
    Loop(Box<Node>),

    /// Espera activa por una cantidad constante de iteraciones.
    Delay(Box<Node>),

    /// Condicional sobre una entrada, con rama `else` opcional.
    If {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
}

impl Node {
    pub fn var(id: Option<VarId>) -> Self {
        Node::Var(id)
    }

    pub fn assign(source: Node, target: Node) -> Self {
        Node::Assign {
            source: Box::new(source),
            target: Box::new(target),
        }
    }

    pub fn repeat(body: Node) -> Self {
        Node::Loop(Box::new(body))
    }

    pub fn delay(amount: Node) -> Self {
        Node::Delay(Box::new(amount))
    }

    pub fn when(condition: Node, then: Node, otherwise: Option<Node>) -> Self {
        Node::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        }
    }

    /// Recorre en preorden todas las referencias a variables del árbol.
    pub fn for_each_var<F>(&self, callback: &mut F)
    where
        F: FnMut(Option<VarId>),
    {
        match self {
            Node::Const(_) => (),
            Node::Var(id) => callback(*id),
            Node::Block(statements) => {
                for statement in statements {
                    statement.for_each_var(callback);
                }
            }

            Node::Assign { source, target } => {
                source.for_each_var(callback);
                target.for_each_var(callback);
            }

            Node::Loop(body) | Node::Delay(body) => body.for_each_var(callback),

            Node::If {
                condition,
                then,
                otherwise,
            } => {
                condition.for_each_var(callback);
                then.for_each_var(callback);
                if let Some(otherwise) = otherwise {
                    otherwise.for_each_var(callback);
                }
            }
        }
    }

    /// Vista imprimible del árbol, con nombres tomados de un registro.
    pub fn dump<'a>(&'a self, registry: &'a Registry) -> Dump<'a> {
        Dump {
            node: self,
            registry,
        }
    }
}

/// Volcado indentado de un árbol. Ver [`Node::dump()`].
pub struct Dump<'a> {
    node: &'a Node,
    registry: &'a Registry,
}

/// Columnas de indentación por nivel.
const INDENT: usize = 4;

impl Dump<'_> {
    fn write(&self, fmt: &mut fmt::Formatter<'_>, node: &Node, level: usize) -> fmt::Result {
        write!(fmt, "{:level$}", "", level = level)?;

        match node {
            Node::Const(value) => writeln!(fmt, "const: {}", value),
            Node::Var(id) => writeln!(fmt, "var({})", self.name(*id)),

            Node::Block(statements) => {
                writeln!(fmt, "block")?;
                for statement in statements {
                    self.write(fmt, statement, level + INDENT)?;
                }

                Ok(())
            }

            Node::Assign { source, target } => {
                writeln!(fmt, "assign")?;
                self.write(fmt, source, level + INDENT)?;
                self.write(fmt, target, level + INDENT)
            }

            Node::Loop(body) => {
                writeln!(fmt, "loop")?;
                self.write(fmt, body, level + INDENT)
            }

            Node::Delay(amount) => match amount.as_ref() {
                Node::Const(value) => writeln!(fmt, "delay: {}", value),
                other => {
                    writeln!(fmt, "delay")?;
                    self.write(fmt, other, level + INDENT)
                }
            },

            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let name = match condition.as_ref() {
                    Node::Var(id) => self.name(*id),
                    _ => "?",
                };

                let kind = if otherwise.is_some() { "if-else" } else { "if" };
                writeln!(fmt, "{} ({})", kind, name)?;

                self.write(fmt, then, level + INDENT)?;
                if let Some(otherwise) = otherwise {
                    self.write(fmt, otherwise, level + INDENT)?;
                }

                Ok(())
            }
        }
    }

    fn name(&self, id: Option<VarId>) -> &str {
        id.and_then(|id| self.registry.get(id))
            .map_or("NULL", |binding| binding.name())
    }
}

impl Display for Dump<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(fmt, self.node, 0)
    }
}
