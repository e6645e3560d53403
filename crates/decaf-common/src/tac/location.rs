use std::collections::HashMap;

/// Size in bytes of every variable and temporary.
pub const VAR_SIZE: i32 = 4;

pub const OFFSET_TO_FIRST_LOCAL: i32 = -8;
pub const OFFSET_TO_FIRST_PARAM: i32 = 4;
pub const OFFSET_TO_FIRST_GLOBAL: i32 = 0;

/// The name of the receiver of an instance method.
pub const RECEIVER_NAME: &str = "this";

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Segment {
    /// Relative to the frame pointer.
    Stack,

    /// Relative to the global pointer.
    Static,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LocationId(pub(crate) usize);

impl LocationId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A machine register, by its hardware number.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Register(pub usize);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Assignment {
    Register(Register),

    /// Kept in its home slot, i.e. at its segment and offset.
    Memory,
}

#[derive(Clone, Debug)]
pub struct Location {
    pub name: String,
    pub segment: Segment,
    pub offset: i32,

    /// For indirect locations: the base and the byte offset from it.
    pub reference: Option<(LocationId, i32)>,

    assignment: Option<Assignment>,
}

impl Location {
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn assignment(&self) -> Option<Assignment> {
        self.assignment
    }
}

/// Arena of every location in a program. Direct locations are interned on
/// their name, segment and offset, so asking for the same triple twice yields
/// the same id.
#[derive(Debug, Default)]
pub struct Locations {
    locations: Vec<Location>,
    interned: HashMap<(String, Segment, i32), LocationId>,
}

impl Locations {
    pub fn new() -> Self {
        Self {
            locations: Vec::new(),
            interned: HashMap::new(),
        }
    }

    pub fn add(&mut self, segment: Segment, offset: i32, name: impl Into<String>) -> LocationId {
        let name = name.into();
        let key = (name, segment, offset);

        if let Some(id) = self.interned.get(&key) {
            return *id;
        }

        let id = LocationId(self.locations.len());
        self.locations.push(Location {
            name: key.0.clone(),
            segment,
            offset,
            reference: None,
            assignment: None,
        });

        self.interned.insert(key, id);
        id
    }

    /// Forget the stack locations seen so far, so that a new function's
    /// `x` at -8 is not mistaken for the previous function's.
    pub fn new_frame(&mut self) {
        self.interned
            .retain(|(_, segment, _), _| *segment == Segment::Static);
    }

    /// Make an indirect location `offset` bytes past whatever `base` points to.
    /// `base` may itself be indirect.
    pub fn reference(&mut self, base: LocationId, offset: i32) -> LocationId {
        let of = self.get(&self.base(base));

        let location = Location {
            name: of.name.clone(),
            segment: of.segment,
            offset: of.offset,
            reference: Some((base, offset)),
            assignment: None,
        };

        let id = LocationId(self.locations.len());
        self.locations.push(location);
        id
    }

    pub fn get(&self, id: &LocationId) -> &Location {
        &self.locations[id.0]
    }

    pub fn name(&self, id: &LocationId) -> &str {
        &self.get(id).name
    }

    /// The direct location at the bottom of a chain of references.
    pub fn base(&self, mut id: LocationId) -> LocationId {
        while let Some((base, _)) = self.get(&id).reference {
            id = base;
        }

        id
    }

    /// The location that takes part in liveness and allocation when `id` is
    /// mentioned, if any. Static data always lives in memory.
    pub fn tracked(&self, id: LocationId) -> Option<LocationId> {
        let base = self.base(id);
        match self.get(&base).segment {
            Segment::Stack => Some(base),
            Segment::Static => None,
        }
    }

    /// Record the final assignment of a direct location. Assignments are
    /// written exactly once.
    pub fn assign(&mut self, id: LocationId, assignment: Assignment) {
        let location = &mut self.locations[id.0];
        assert!(location.reference.is_none());
        assert!(location.assignment.replace(assignment).is_none());
    }

    pub fn assignment(&self, id: &LocationId) -> Option<Assignment> {
        self.get(&self.base(*id)).assignment
    }

    /// Give every direct location that has not been assigned anything its
    /// memory home. Returns how many were touched.
    pub fn settle(&mut self) -> usize {
        let mut count = 0;
        for location in self.locations.iter_mut() {
            if location.reference.is_none() && location.assignment.is_none() {
                location.assignment = Some(Assignment::Memory);
                count += 1;
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Location)> {
        self.locations
            .iter()
            .enumerate()
            .map(|(id, location)| (LocationId(id), location))
    }
}
