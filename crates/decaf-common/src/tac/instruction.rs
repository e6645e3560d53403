use std::collections::BTreeSet;

use super::location::{LocationId, Locations};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    Less,
    And,
    Or,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 9] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Equal,
        Self::Less,
        Self::And,
        Self::Or,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Equal => "==",
            Self::Less => "<",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

/// What a `BeginFunc` knows about the function it opens.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
    /// Bytes needed for locals and temporaries.
    pub size: i32,

    pub formals: Vec<LocationId>,

    /// The `this` parameter of an instance method.
    pub receiver: Option<LocationId>,
}

impl Frame {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Every parameter, receiver first.
    pub fn params(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.receiver.iter().chain(self.formals.iter()).copied()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inst {
    LoadConstant {
        dst: LocationId,
        value: i32,
    },

    LoadString {
        dst: LocationId,
        value: String,
    },

    LoadLabel {
        dst: LocationId,
        label: String,
    },

    Copy {
        dst: LocationId,
        src: LocationId,
    },

    /// `dst = *(src + offset)`
    Load {
        dst: LocationId,
        src: LocationId,
        offset: i32,
    },

    /// `*(dst + offset) = src`
    Store {
        dst: LocationId,
        src: LocationId,
        offset: i32,
    },

    Binary {
        op: BinaryOp,
        dst: LocationId,
        lhs: LocationId,
        rhs: LocationId,
    },

    Label(String),
    Goto(String),
    IfZ {
        test: LocationId,
        label: String,
    },

    BeginFunc(Frame),
    EndFunc,
    Return(Option<LocationId>),

    PushParam(LocationId),
    PopParams(i32),
    LCall {
        label: String,
        dst: Option<LocationId>,
    },
    ACall {
        addr: LocationId,
        dst: Option<LocationId>,
    },

    VTable {
        label: String,
        methods: Vec<String>,
    },
}

impl Inst {
    /// Whether the instruction does anything beyond writing its destination.
    pub fn has_effect(&self) -> bool {
        match self {
            Self::LoadConstant { .. }
            | Self::LoadString { .. }
            | Self::LoadLabel { .. }
            | Self::Copy { .. }
            | Self::Load { .. }
            | Self::Binary { .. } => false,

            Self::Store { .. }
            | Self::Label(_)
            | Self::Goto(_)
            | Self::IfZ { .. }
            | Self::BeginFunc(_)
            | Self::EndFunc
            | Self::Return(_)
            | Self::PushParam(_)
            | Self::PopParams(_)
            | Self::LCall { .. }
            | Self::ACall { .. }
            | Self::VTable { .. } => true,
        }
    }

    /// Every location the instruction mentions, in operand order.
    pub fn operands(&self) -> Vec<LocationId> {
        match self {
            Self::LoadConstant { dst, .. }
            | Self::LoadString { dst, .. }
            | Self::LoadLabel { dst, .. } => vec![*dst],

            Self::Copy { dst, src }
            | Self::Load { dst, src, .. }
            | Self::Store { dst, src, .. } => vec![*dst, *src],

            Self::Binary { dst, lhs, rhs, .. } => vec![*dst, *lhs, *rhs],

            Self::IfZ { test, .. } => vec![*test],
            Self::BeginFunc(frame) => frame.params().collect(),
            Self::Return(value) => value.iter().copied().collect(),
            Self::PushParam(param) => vec![*param],
            Self::LCall { dst, .. } => dst.iter().copied().collect(),
            Self::ACall { addr, dst } => dst.iter().chain(Some(addr)).copied().collect(),

            Self::Label(_) | Self::Goto(_) | Self::EndFunc | Self::PopParams(_) => vec![],
            Self::VTable { .. } => vec![],
        }
    }
}

/// A three-address instruction together with its `defines` (kill) and `uses`
/// (gen) sets. Both are fixed when the instruction is made.
#[derive(Clone, Debug)]
pub struct Instruction {
    inst: Inst,
    defines: BTreeSet<LocationId>,
    uses: BTreeSet<LocationId>,
}

impl Instruction {
    pub fn new(inst: Inst, locations: &Locations) -> Self {
        let mut kills = Vec::new();
        let mut gens = Vec::new();

        match &inst {
            Inst::LoadConstant { dst, .. }
            | Inst::LoadString { dst, .. }
            | Inst::LoadLabel { dst, .. } => kills.push(*dst),

            Inst::Copy { dst, src } | Inst::Load { dst, src, .. } => {
                kills.push(*dst);
                gens.push(*src);
            }

            Inst::Store { dst, src, .. } => gens.extend([*dst, *src]),

            Inst::Binary { dst, lhs, rhs, .. } => {
                kills.push(*dst);
                gens.extend([*lhs, *rhs]);
            }

            Inst::IfZ { test, .. } => gens.push(*test),

            // Parameters are loaded into their registers on entry.
            Inst::BeginFunc(frame) => kills.extend(frame.params()),

            Inst::Return(value) => gens.extend(value.iter().copied()),
            Inst::PushParam(param) => gens.push(*param),
            Inst::LCall { dst, .. } => kills.extend(dst.iter().copied()),
            Inst::ACall { addr, dst } => {
                gens.push(*addr);
                kills.extend(dst.iter().copied());
            }

            Inst::Label(_)
            | Inst::Goto(_)
            | Inst::EndFunc
            | Inst::PopParams(_)
            | Inst::VTable { .. } => {}
        }

        let mut defines = BTreeSet::new();
        let mut uses = BTreeSet::new();

        // Writing through an indirect location reads its base.
        for kill in kills {
            if locations.get(&kill).is_reference() {
                uses.extend(locations.tracked(kill));
            } else {
                defines.extend(locations.tracked(kill));
            }
        }

        for gen in gens {
            uses.extend(locations.tracked(gen));
        }

        Self {
            inst,
            defines,
            uses,
        }
    }

    pub fn inst(&self) -> &Inst {
        &self.inst
    }

    pub fn defines(&self) -> &BTreeSet<LocationId> {
        &self.defines
    }

    pub fn uses(&self) -> &BTreeSet<LocationId> {
        &self.uses
    }

    /// Backpatch the frame size of a `BeginFunc`.
    pub fn set_frame_size(&mut self, size: i32) {
        match &mut self.inst {
            Inst::BeginFunc(frame) => frame.size = size,
            _ => unreachable!("only `BeginFunc` has a frame"),
        }
    }
}
