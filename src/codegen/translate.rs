use super::{Context, Label};
use crate::{arch::Emitter, ast::Node, error::CodegenError};
use std::io;

impl<E: Emitter> Context<'_, E> {
    /// Traduce un nodo y sus hijos.
    pub(super) fn translate(&mut self, node: &Node) -> io::Result<()> {
        match node {
            // Solo tienen sentido como operandos
            Node::Const(_) | Node::Var(_) => Ok(()),

            Node::Block(statements) => {
                for statement in statements {
                    self.translate(statement)?;
                }

                Ok(())
            }

            Node::Assign { source, target } => self.assign(source, target),

            Node::Loop(body) => {
                let top = self.labels.next();

                self.emitter.set_label(top)?;
                self.translate(body)?;
                self.emitter.jump(top)
            }

            Node::Delay(amount) => self.delay(amount),

            Node::If {
                condition,
                then,
                otherwise,
            } => self.branch(condition, then, otherwise.as_deref()),
        }
    }

    fn assign(&mut self, source: &Node, target: &Node) -> io::Result<()> {
        let target = match self.variable(target, "assign") {
            Some(target) => target,
            None => return Ok(()),
        };

        match source {
            Node::Const(value) => {
                self.emitter
                    .statement(format_args!("assign to variable {}", target.name()))?;

                self.emitter
                    .write_port(target.port(), target.mask(), *value != 0)
            }

            Node::Var(_) => {
                let source = match self.variable(source, "assign") {
                    Some(source) => source,
                    None => return Ok(()),
                };

                self.emitter.statement(format_args!(
                    "assign {} to {}",
                    source.name(),
                    target.name()
                ))?;

                // No hay move condicional, la salida se copia con un if-else
                self.emitter.test_port(source.port(), source.mask())?;

                let (then, end) = self.branch_labels();
                self.emitter.branch_if_set(then)?;

                self.emitter
                    .write_port(target.port(), target.mask(), false)?;
                self.emitter.jump(end)?;

                self.emitter.set_label(then)?;
                self.emitter
                    .write_port(target.port(), target.mask(), true)?;

                self.emitter.set_label(end)
            }

            _ => {
                self.report::<()>(CodegenError::UnexpectedOperand {
                    statement: "assign",
                    expected: "constant or variable",
                });

                Ok(())
            }
        }
    }

    fn delay(&mut self, amount: &Node) -> io::Result<()> {
        let count = match amount {
            Node::Const(count) => *count,
            _ => {
                self.report::<()>(CodegenError::UnexpectedOperand {
                    statement: "delay",
                    expected: "constant",
                });

                return Ok(());
            }
        };

        self.emitter.statement(format_args!("delay {}", count))?;

        // El rango no se valida contra el ancho del registro
        let label = self.labels.next();
        self.emitter.countdown(count as u32, label)
    }

    fn branch(&mut self, condition: &Node, then: &Node, otherwise: Option<&Node>) -> io::Result<()> {
        let condition = match self.variable(condition, "if") {
            Some(condition) => condition,
            None => return Ok(()),
        };

        // Las etiquetas se reservan antes de traducir las ramas
        let (then_label, end) = self.branch_labels();

        self.emitter
            .statement(format_args!("if ({})", condition.name()))?;
        self.emitter
            .test_port(condition.port(), condition.mask())?;
        self.emitter.branch_if_set(then_label)?;

        // La rama else queda en el camino sin salto
        if let Some(otherwise) = otherwise {
            self.translate(otherwise)?;
        }

        self.emitter.jump(end)?;

        self.emitter.set_label(then_label)?;
        self.translate(then)?;

        self.emitter.set_label(end)
    }

    /// Reserva las etiquetas `then` y `end` de una bifurcación.
    ///
    /// Entre ambas se reserva una tercera etiqueta que nunca se emite. La
    /// numeración resultante debe coincidir con la de listados existentes.
    fn branch_labels(&mut self) -> (Label, Label) {
        let then = self.labels.next();
        let _unused = self.labels.next();
        let end = self.labels.next();

        (then, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arch::Pic32,
        board::Registry,
        error::{CodegenError, Diagnostics},
    };

    use std::collections::HashSet;

    /// Traduce únicamente el cuerpo, sin prólogo ni epílogo.
    fn body(root: &Node, registry: &Registry) -> (String, Diagnostics, u32) {
        let mut output = Vec::new();
        let mut cx = Context::new(Pic32::new(&mut output), registry);
        cx.translate(root).unwrap();

        let labels = cx.labels.allocated();
        let diagnostics = cx.diagnostics;

        (String::from_utf8(output).unwrap(), diagnostics, labels)
    }

    fn var(registry: &Registry, name: &str) -> Node {
        Node::var(Some(registry.lookup(name).unwrap()))
    }

    #[test]
    fn constant_zero_clears() {
        let registry = Registry::board();
        let root = Node::assign(Node::Const(0), var(&registry, "R"));

        let (asm, diagnostics, labels) = body(&root, &registry);
        assert_eq!(
            asm,
            "\t\n\
             \t# assign to variable R\n\
             \tlui\t$8,%hi(LATDCLR)\n\
             \tli\t$9,0x4\n\
             \tsw\t$9,%lo(LATDCLR)($8)\n"
        );

        assert!(diagnostics.is_empty());
        assert_eq!(labels, 0);
    }

    #[test]
    fn any_nonzero_constant_sets() {
        let registry = Registry::board();

        for value in &[1, 2, -1] {
            let root = Node::assign(Node::Const(*value), var(&registry, "LD5"));
            let (asm, _, labels) = body(&root, &registry);

            assert_eq!(asm.matches("\tsw\t$9,%lo(LATASET)($8)\n").count(), 1);
            assert!(!asm.contains("CLR"));
            assert!(!asm.contains(".lbl"));
            assert_eq!(labels, 0);
        }
    }

    #[test]
    fn variable_assign_mirrors_source() {
        let registry = Registry::board();
        let root = Node::assign(var(&registry, "SW1"), var(&registry, "LD2"));

        let (asm, _, labels) = body(&root, &registry);
        assert_eq!(
            asm,
            "\t\n\
             \t# assign SW1 to LD2\n\
             \tlui\t$8,%hi(PORTF)\n\
             \tlw\t$9,%lo(PORTF)($8)\n\
             \tandi\t$9,$9,0x20\n\
             \tbne\t$9,$0,.lbl1\n\
             \tnop\n\
             \tlui\t$8,%hi(LATACLR)\n\
             \tli\t$9,0x4\n\
             \tsw\t$9,%lo(LATACLR)($8)\n\
             \tj\t.lbl3\n\
             \tnop\n\
             .lbl1:\n\
             \tlui\t$8,%hi(LATASET)\n\
             \tli\t$9,0x4\n\
             \tsw\t$9,%lo(LATASET)($8)\n\
             .lbl3:\n"
        );

        assert_eq!(labels, 3);
        assert!(!asm.contains(".lbl2"));
    }

    #[test]
    fn if_else_orders_else_before_then() {
        let registry = Registry::board();
        let root = Node::when(
            var(&registry, "SW0"),
            Node::Block(vec![Node::assign(Node::Const(1), var(&registry, "LD0"))]),
            Some(Node::Block(vec![Node::assign(
                Node::Const(0),
                var(&registry, "LD0"),
            )])),
        );

        let (asm, diagnostics, _) = body(&root, &registry);
        assert!(diagnostics.is_empty());
        assert_eq!(
            asm,
            "\t\n\
             \t# if (SW0)\n\
             \tlui\t$8,%hi(PORTF)\n\
             \tlw\t$9,%lo(PORTF)($8)\n\
             \tandi\t$9,$9,0x8\n\
             \tbne\t$9,$0,.lbl1\n\
             \tnop\n\
             \t\n\
             \t# assign to variable LD0\n\
             \tlui\t$8,%hi(LATACLR)\n\
             \tli\t$9,0x1\n\
             \tsw\t$9,%lo(LATACLR)($8)\n\
             \tj\t.lbl3\n\
             \tnop\n\
             .lbl1:\n\
             \t\n\
             \t# assign to variable LD0\n\
             \tlui\t$8,%hi(LATASET)\n\
             \tli\t$9,0x1\n\
             \tsw\t$9,%lo(LATASET)($8)\n\
             .lbl3:\n"
        );
    }

    #[test]
    fn if_without_else_jumps_to_end() {
        let registry = Registry::board();
        let root = Node::when(
            var(&registry, "SW4"),
            Node::assign(Node::Const(1), var(&registry, "B")),
            None,
        );

        let (asm, _, labels) = body(&root, &registry);

        let branch = asm.find("\tbne\t$9,$0,.lbl1\n\tnop\n\tj\t.lbl3\n").unwrap();
        let then = asm.find(".lbl1:\n").unwrap();
        let set = asm.find("LATDSET").unwrap();
        let end = asm.find(".lbl3:\n").unwrap();

        assert!(branch < then && then < set && set < end);
        assert!(asm.ends_with(".lbl3:\n"));
        assert_eq!(labels, 3);
    }

    #[test]
    fn nested_branch_labels_follow_outer_ones() {
        let registry = Registry::board();
        let inner = Node::when(
            var(&registry, "SW2"),
            Node::assign(Node::Const(1), var(&registry, "LD1")),
            None,
        );
        let root = Node::when(var(&registry, "SW0"), inner, None);

        let (asm, _, labels) = body(&root, &registry);

        // Externo: 1 y 3. Interno: 4 y 6
        assert!(asm.contains("\tbne\t$9,$0,.lbl1\n"));
        assert!(asm.contains("\tbne\t$9,$0,.lbl4\n"));
        assert!(asm.ends_with(".lbl6:\n.lbl3:\n"));
        assert_eq!(labels, 6);
    }

    #[test]
    fn loop_jumps_back_around_delay() {
        let registry = Registry::board();
        let root = Node::repeat(Node::Block(vec![Node::delay(Node::Const(5))]));

        let (asm, _, _) = body(&root, &registry);
        assert_eq!(
            asm,
            ".lbl1:\n\
             \t\n\
             \t# delay 5\n\
             \tli\t$10,0x5\n\
             .lbl2:\n\
             \taddi\t$10,$10,-1\n\
             \tbne\t$10,$0,.lbl2\n\
             \tnop\n\
             \tj\t.lbl1\n\
             \tnop\n"
        );
    }

    #[test]
    fn negative_delay_wraps_to_register_width() {
        let registry = Registry::board();
        let root = Node::delay(Node::Const(-1));

        let (asm, diagnostics, labels) = body(&root, &registry);
        assert!(diagnostics.is_empty());
        assert_eq!(labels, 1);
        assert_eq!(
            asm,
            "\t\n\
             \t# delay -1\n\
             \tli\t$10,0xffffffff\n\
             .lbl1:\n\
             \taddi\t$10,$10,-1\n\
             \tbne\t$10,$0,.lbl1\n\
             \tnop\n"
        );
    }

    #[test]
    fn missing_variable_skips_only_its_statement() {
        let registry = Registry::board();
        let root = Node::Block(vec![
            Node::assign(Node::Const(1), Node::var(None)),
            Node::assign(Node::Const(1), var(&registry, "LD1")),
        ]);

        let (asm, diagnostics, _) = body(&root, &registry);

        assert_eq!(
            diagnostics.errors(),
            &[CodegenError::UndefinedVariable("assign")]
        );

        assert_eq!(asm.matches("# assign").count(), 1);
        assert!(asm.contains("# assign to variable LD1\n"));
    }

    #[test]
    fn missing_source_or_condition_allocates_nothing() {
        let registry = Registry::board();
        let root = Node::Block(vec![
            Node::assign(Node::var(None), var(&registry, "LD0")),
            Node::when(
                Node::var(None),
                Node::assign(Node::Const(1), var(&registry, "LD0")),
                None,
            ),
        ]);

        let (asm, diagnostics, labels) = body(&root, &registry);

        assert!(asm.is_empty());
        assert_eq!(labels, 0);
        assert_eq!(
            diagnostics.errors(),
            &[
                CodegenError::UndefinedVariable("assign"),
                CodegenError::UndefinedVariable("if"),
            ]
        );
    }

    #[test]
    fn malformed_operands_are_reported() {
        let registry = Registry::board();
        let root = Node::Block(vec![
            Node::delay(var(&registry, "SW0")),
            Node::assign(Node::Block(vec![]), var(&registry, "LD0")),
            Node::assign(Node::Const(1), Node::Const(2)),
            Node::Const(7),
        ]);

        let (asm, diagnostics, _) = body(&root, &registry);

        assert!(asm.is_empty());
        assert_eq!(diagnostics.errors().len(), 3);
        assert_eq!(
            diagnostics.errors()[0],
            CodegenError::UnexpectedOperand {
                statement: "delay",
                expected: "constant",
            }
        );
    }

    #[test]
    fn labels_are_unique_and_defined() {
        let registry = Registry::board();
        let sw = |name| var(&registry, name);

        let root = Node::Block(vec![
            Node::assign(sw("SW0"), sw("LD0")),
            Node::repeat(Node::Block(vec![
                Node::when(
                    sw("SW1"),
                    Node::Block(vec![
                        Node::assign(sw("SW2"), sw("LD1")),
                        Node::delay(Node::Const(10)),
                    ]),
                    Some(Node::repeat(Node::delay(Node::Const(1)))),
                ),
                Node::when(sw("SW3"), Node::delay(Node::Const(2)), None),
            ])),
        ]);

        let (asm, _, _) = body(&root, &registry);

        let mut defined = HashSet::new();
        for line in asm.lines().filter(|line| line.ends_with(':')) {
            assert!(defined.insert(line.trim_end_matches(':')), "{}", line);
        }

        for line in asm.lines() {
            if let Some(target) = line.split(|c| c == ',' || c == '\t').last() {
                if target.starts_with(".lbl") && !line.ends_with(':') {
                    assert!(defined.contains(target), "{}", line);
                }
            }
        }

        assert!(defined.len() > 5);
    }
}
