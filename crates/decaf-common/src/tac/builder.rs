use log::trace;

use super::instruction::{BinaryOp, Frame, Inst, Instruction};
use super::location::{
    LocationId, Locations, Segment, OFFSET_TO_FIRST_GLOBAL, OFFSET_TO_FIRST_LOCAL,
    OFFSET_TO_FIRST_PARAM, RECEIVER_NAME, VAR_SIZE,
};
use super::Program;
use crate::names::NameGenerator;
use crate::Failure;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Builtin {
    Alloc,
    ReadLine,
    ReadInteger,
    StringEqual,
    PrintInt,
    PrintString,
    PrintBool,
    Halt,
}

impl Builtin {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alloc => "_Alloc",
            Self::ReadLine => "_ReadLine",
            Self::ReadInteger => "_ReadInteger",
            Self::StringEqual => "_StringEqual",
            Self::PrintInt => "_PrintInt",
            Self::PrintString => "_PrintString",
            Self::PrintBool => "_PrintBool",
            Self::Halt => "_Halt",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::ReadLine | Self::ReadInteger | Self::Halt => 0,
            Self::Alloc | Self::PrintInt | Self::PrintString | Self::PrintBool => 1,
            Self::StringEqual => 2,
        }
    }

    pub fn has_return(&self) -> bool {
        matches!(
            self,
            Self::Alloc | Self::ReadLine | Self::ReadInteger | Self::StringEqual
        )
    }
}

/// Appends three-address instructions to a program under construction, and
/// hands out the frame and static offsets of the locations they mention.
#[derive(Debug)]
pub struct TacBuilder<'a> {
    names: &'a mut NameGenerator,

    code: Vec<Instruction>,
    locations: Locations,
    globals: Vec<LocationId>,

    next_local: i32,
    next_global: i32,

    /// The index of the `BeginFunc` of the function being built.
    open: Option<usize>,
    declared_size: Option<i32>,
}

impl<'a> TacBuilder<'a> {
    pub fn new(names: &'a mut NameGenerator) -> Self {
        Self {
            names,
            code: Vec::new(),
            locations: Locations::new(),
            globals: Vec::new(),
            next_local: OFFSET_TO_FIRST_LOCAL,
            next_global: OFFSET_TO_FIRST_GLOBAL,
            open: None,
            declared_size: None,
        }
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// A fresh temporary in the current frame.
    pub fn temp(&mut self) -> LocationId {
        let name = self.names.temp();
        self.local(name)
    }

    /// A named local in the current frame.
    pub fn local(&mut self, name: impl Into<String>) -> LocationId {
        let offset = self.next_local;
        self.next_local -= VAR_SIZE;
        self.locations.add(Segment::Stack, offset, name)
    }

    pub fn global(&mut self, name: impl Into<String>) -> LocationId {
        let offset = self.next_global;
        self.next_global += VAR_SIZE;
        let id = self.locations.add(Segment::Static, offset, name);
        self.globals.push(id);
        id
    }

    /// An indirect location `offset` bytes past what `base` points to.
    pub fn reference(&mut self, base: LocationId, offset: i32) -> LocationId {
        self.locations.reference(base, offset)
    }

    /// Append an instruction whose operands have already been made.
    pub fn emit(&mut self, inst: Inst) -> usize {
        let instruction = Instruction::new(inst, &self.locations);
        self.code.push(instruction);
        self.code.len() - 1
    }

    pub fn load_constant(&mut self, value: i32) -> LocationId {
        let dst = self.temp();
        self.emit(Inst::LoadConstant { dst, value });
        dst
    }

    pub fn load_string(&mut self, value: impl Into<String>) -> LocationId {
        let dst = self.temp();
        let value = value.into();
        self.emit(Inst::LoadString { dst, value });
        dst
    }

    pub fn load_label(&mut self, label: impl Into<String>) -> LocationId {
        let dst = self.temp();
        let label = label.into();
        self.emit(Inst::LoadLabel { dst, label });
        dst
    }

    pub fn assign(&mut self, dst: LocationId, src: LocationId) {
        self.emit(Inst::Copy { dst, src });
    }

    pub fn load(&mut self, src: LocationId, offset: i32) -> LocationId {
        let dst = self.temp();
        self.emit(Inst::Load { dst, src, offset });
        dst
    }

    pub fn store(&mut self, dst: LocationId, src: LocationId, offset: i32) {
        self.emit(Inst::Store { dst, src, offset });
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: LocationId, rhs: LocationId) -> LocationId {
        let dst = self.temp();
        self.emit(Inst::Binary { op, dst, lhs, rhs });
        dst
    }

    pub fn label(&mut self, label: impl Into<String>) {
        self.emit(Inst::Label(label.into()));
    }

    pub fn if_z(&mut self, test: LocationId, label: impl Into<String>) {
        let label = label.into();
        self.emit(Inst::IfZ { test, label });
    }

    pub fn goto(&mut self, label: impl Into<String>) {
        self.emit(Inst::Goto(label.into()));
    }

    pub fn ret(&mut self, value: Option<LocationId>) {
        self.emit(Inst::Return(value));
    }

    /// Open a function. Formals get positive frame offsets in order, shifted
    /// by one slot for methods, whose receiver sits first.
    pub fn begin_func<S: Into<String>>(
        &mut self,
        formals: impl IntoIterator<Item = S>,
        is_method: bool,
    ) -> Result<Frame, Failure> {
        if let Some(at) = self.open {
            return Err(Failure::UnclosedFunction { at });
        }

        self.locations.new_frame();
        self.next_local = OFFSET_TO_FIRST_LOCAL;
        self.declared_size = None;

        let receiver = is_method.then(|| {
            self.locations
                .add(Segment::Stack, OFFSET_TO_FIRST_PARAM, RECEIVER_NAME)
        });

        let shift = i32::from(is_method);
        let formals = formals
            .into_iter()
            .zip(0..)
            .map(|(name, i)| {
                let offset = OFFSET_TO_FIRST_PARAM + VAR_SIZE * (i + shift);
                self.locations.add(Segment::Stack, offset, name)
            })
            .collect();

        let frame = Frame {
            size: 0,
            formals,
            receiver,
        };

        self.open = Some(self.emit(Inst::BeginFunc(frame.clone())));
        Ok(frame)
    }

    /// Use `size` as the frame size of the open function instead of the
    /// high-water mark of its locals.
    pub fn declare_frame_size(&mut self, size: i32) {
        self.declared_size = Some(size);
    }

    /// Close the open function and backpatch its frame size.
    pub fn end_func(&mut self) -> Result<(), Failure> {
        let at = self.code.len();
        let begin = self.open.take().ok_or(Failure::UnmatchedEnd { at })?;

        let size = self
            .declared_size
            .take()
            .unwrap_or(OFFSET_TO_FIRST_LOCAL - self.next_local);

        trace!("frame of function at instruction {begin} needs {size} bytes");
        self.code[begin].set_frame_size(size);
        self.emit(Inst::EndFunc);
        Ok(())
    }

    pub fn push_param(&mut self, param: LocationId) {
        self.emit(Inst::PushParam(param));
    }

    /// Pop `bytes` of pushed parameters. Nothing is emitted for zero bytes.
    pub fn pop_params(&mut self, bytes: i32) -> Result<(), Failure> {
        if bytes < 0 || bytes % VAR_SIZE != 0 {
            let at = self.code.len();
            return Err(Failure::MisalignedPop { bytes, at });
        }

        if bytes > 0 {
            self.emit(Inst::PopParams(bytes));
        }

        Ok(())
    }

    pub fn lcall(&mut self, label: impl Into<String>, has_result: bool) -> Option<LocationId> {
        let dst = has_result.then(|| self.temp());
        let label = label.into();
        self.emit(Inst::LCall { label, dst });
        dst
    }

    pub fn acall(&mut self, addr: LocationId, has_result: bool) -> Option<LocationId> {
        let dst = has_result.then(|| self.temp());
        self.emit(Inst::ACall { addr, dst });
        dst
    }

    /// Call a runtime builtin. Arguments are pushed last to first.
    pub fn builtin(
        &mut self,
        builtin: Builtin,
        args: &[LocationId],
    ) -> Result<Option<LocationId>, Failure> {
        if args.len() != builtin.arity() {
            return Err(Failure::Arity {
                name: builtin.label(),
                expected: builtin.arity(),
                given: args.len(),
                at: self.code.len(),
            });
        }

        for arg in args.iter().rev() {
            self.push_param(*arg);
        }

        let result = self.lcall(builtin.label(), builtin.has_return());
        self.pop_params(VAR_SIZE * args.len() as i32)?;
        Ok(result)
    }

    pub fn vtable(&mut self, label: impl Into<String>, methods: Vec<String>) {
        let label = label.into();
        self.emit(Inst::VTable { label, methods });
    }

    pub fn build(self) -> Result<Program, Failure> {
        if let Some(at) = self.open {
            return Err(Failure::UnclosedFunction { at });
        }

        Ok(Program {
            code: self.code,
            locations: self.locations,
            globals: self.globals,
        })
    }
}
