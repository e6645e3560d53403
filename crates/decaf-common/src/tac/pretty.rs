use std::collections::HashMap;

use pretty::{Arena, DocAllocator, DocBuilder};

use super::instruction::{Inst, Instruction};
use super::location::{Assignment, LocationId, Locations, Register, Segment};
use super::Program;

/// Prints three-address code in its textual notation, one instruction per
/// line. When given register names, every line also lists where each of its
/// operands ended up.
pub struct Prettier<'a> {
    locations: &'a Locations,
    registers: Option<&'a HashMap<Register, &'static str>>,
    allocator: Arena<'a>,
    width: usize,
}

impl<'a> Prettier<'a> {
    pub fn new(locations: &'a Locations) -> Self {
        Self {
            locations,
            registers: None,
            allocator: Arena::new(),
            width: 80,
        }
    }

    pub fn with_registers(self, registers: &'a HashMap<Register, &'static str>) -> Self {
        Self {
            registers: Some(registers),
            ..self
        }
    }

    pub fn pretty_program(&'a self, program: &Program) -> String {
        let globals = program.globals.iter().map(|global| self.doc_global(global));
        let code = program.code.iter().map(|inst| self.doc_instruction(inst));
        self.render(globals.chain(code).collect())
    }

    pub fn pretty_instruction(&'a self, inst: &Instruction) -> String {
        let doc = self.doc_instruction(inst);
        let mut res = Vec::new();
        doc.render(self.width, &mut res).unwrap();
        String::from_utf8(res).unwrap()
    }

    fn render(&'a self, lines: Vec<DocBuilder<'a, Arena<'a>>>) -> String {
        if lines.is_empty() {
            return String::new();
        }

        let doc = self
            .allocator
            .intersperse(lines, self.allocator.hardline())
            .append(self.allocator.hardline());

        let mut res = Vec::new();
        doc.render(self.width, &mut res).unwrap();
        String::from_utf8(res).unwrap()
    }

    fn doc_global(&'a self, global: &LocationId) -> DocBuilder<'a, Arena<'a>> {
        self.allocator
            .text(format!("Global {}", self.name(global)))
            .append(self.allocator.text(" ;"))
    }

    fn doc_instruction(&'a self, inst: &Instruction) -> DocBuilder<'a, Arena<'a>> {
        match inst.inst() {
            Inst::Label(label) => self.allocator.text(format!("{label}:")),
            Inst::VTable { label, methods } => self
                .allocator
                .text(format!("VTable {label} ="))
                .append(self.allocator.concat(methods.iter().map(|method| {
                    self.allocator
                        .hardline()
                        .append(self.allocator.text(format!("\t{method},")))
                })))
                .append(self.allocator.hardline())
                .append(self.allocator.text(";")),
            other => self
                .allocator
                .text("\t")
                .append(self.allocator.text(self.text(other)))
                .append(self.allocator.text(" ;"))
                .append(self.doc_assignments(other)),
        }
    }

    fn doc_assignments(&'a self, inst: &Inst) -> DocBuilder<'a, Arena<'a>> {
        let registers = match self.registers {
            Some(registers) => registers,
            None => return self.allocator.nil(),
        };

        let mut seen = Vec::new();
        for operand in inst.operands() {
            let base = self.locations.base(operand);
            if !seen.contains(&base) {
                seen.push(base);
            }
        }

        if seen.is_empty() {
            return self.allocator.nil();
        }

        let assignments = seen.into_iter().map(|id| {
            let at = match self.locations.assignment(&id) {
                Some(Assignment::Register(reg)) => registers
                    .get(&reg)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("${}", reg.0)),
                Some(Assignment::Memory) => self.home(&id),
                None => "?".into(),
            };

            self.allocator.text(format!("{}: {at}", self.name(&id)))
        });

        self.allocator
            .text("\t# ")
            .append(self.allocator.intersperse(assignments, self.allocator.text(", ")))
    }

    fn home(&self, id: &LocationId) -> String {
        let location = self.locations.get(id);
        let base = match location.segment {
            Segment::Stack => "fp",
            Segment::Static => "gp",
        };

        format!("{base}{:+}", location.offset)
    }

    fn text(&self, inst: &Inst) -> String {
        match inst {
            Inst::LoadConstant { dst, value } => format!("{} = {value}", self.operand(dst)),
            Inst::LoadString { dst, value } => format!("{} = \"{value}\"", self.operand(dst)),
            Inst::LoadLabel { dst, label } => format!("{} = {label}", self.operand(dst)),
            Inst::Copy { dst, src } => format!("{} = {}", self.operand(dst), self.operand(src)),
            Inst::Load { dst, src, offset } => {
                format!("{} = {}", self.operand(dst), self.deref(src, *offset))
            }
            Inst::Store { dst, src, offset } => {
                format!("{} = {}", self.deref(dst, *offset), self.operand(src))
            }
            Inst::Binary { op, dst, lhs, rhs } => format!(
                "{} = {} {} {}",
                self.operand(dst),
                self.operand(lhs),
                op.symbol(),
                self.operand(rhs)
            ),
            Inst::Goto(label) => format!("Goto {label}"),
            Inst::IfZ { test, label } => format!("IfZ {} Goto {label}", self.operand(test)),
            Inst::BeginFunc(frame) => {
                let params: Vec<_> = frame.params().map(|param| self.name(&param)).collect();
                if params.is_empty() {
                    format!("BeginFunc {}", frame.size)
                } else {
                    format!("BeginFunc {} ({})", frame.size, params.join(", "))
                }
            }
            Inst::EndFunc => "EndFunc".into(),
            Inst::Return(Some(value)) => format!("Return {}", self.operand(value)),
            Inst::Return(None) => "Return".into(),
            Inst::PushParam(param) => format!("PushParam {}", self.operand(param)),
            Inst::PopParams(bytes) => format!("PopParams {bytes}"),
            Inst::LCall {
                label,
                dst: Some(dst),
            } => format!("{} = LCall {label}", self.operand(dst)),
            Inst::LCall { label, dst: None } => format!("LCall {label}"),
            Inst::ACall {
                addr,
                dst: Some(dst),
            } => format!("{} = ACall {}", self.operand(dst), self.operand(addr)),
            Inst::ACall { addr, dst: None } => format!("ACall {}", self.operand(addr)),

            Inst::Label(_) | Inst::VTable { .. } => unreachable!(),
        }
    }

    fn deref(&self, base: &LocationId, offset: i32) -> String {
        if offset == 0 {
            format!("*({})", self.operand(base))
        } else {
            format!("*({} + {offset})", self.operand(base))
        }
    }

    /// A location as it is written in an operand position. Indirect locations
    /// are spelled out as the dereference they stand for.
    fn operand(&self, id: &LocationId) -> String {
        match self.locations.get(id).reference {
            Some((base, offset)) => self.deref(&base, offset),
            None => self.name(id).to_string(),
        }
    }

    fn name(&self, id: &LocationId) -> &'a str {
        self.locations.name(id)
    }
}
