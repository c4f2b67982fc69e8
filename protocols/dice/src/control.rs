// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Control elements bound to registers.
//!
//! The module includes structure, enumeration, and its implementation for the tree of control
//! elements. Each switch and volume control is bound to a quadlet register, and any change of it
//! is committed by the write of a message to another register so that the unit reacts to the
//! change.

use {
    super::{register::*, *},
    std::{fmt, ops::RangeInclusive},
};

/// Register and the value written to it to notify the unit of change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommitStrobe {
    pub location: RegisterLocation,
    pub value: u32,
}

impl CommitStrobe {
    pub fn new(location: RegisterLocation, value: u32) -> Self {
        Self { location, value }
    }

    fn fire<A: RegisterAccess + ?Sized>(&self, gateway: &mut A) -> Result<(), Error> {
        write_quadlet(
            gateway,
            self.location.space(),
            self.location.offset(),
            self.value,
        )
    }
}

fn check_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.contains('/') {
        let msg = format!("Invalid name of element: '{}'", name);
        Err(Error::new(ErrorKind::Usage, &msg))
    } else {
        Ok(())
    }
}

fn check_quadlet(location: &RegisterLocation) -> Result<(), Error> {
    if location.width() != QUADLET_SIZE {
        let msg = format!(
            "Element should be bound to quadlet register, but {} bytes",
            location.width()
        );
        Err(Error::new(ErrorKind::Usage, &msg))
    } else {
        Ok(())
    }
}

fn read_location<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    location: &RegisterLocation,
) -> Result<u32, Error> {
    read_quadlet(gateway, location.space(), location.offset())
}

// Write the payload, then confirm that the unit holds the masked bits before committing.
fn write_and_verify<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    location: &RegisterLocation,
    val: u32,
    mask: u32,
) -> Result<(), Error> {
    write_quadlet(gateway, location.space(), location.offset(), val)?;
    let held = read_location(gateway, location)?;
    if held & mask != val & mask {
        let msg = format!(
            "{:?} at 0x{:04x} does not hold 0x{:08x}, but 0x{:08x}",
            location.space(),
            location.offset(),
            val & mask,
            held & mask
        );
        Err(Error::new(ErrorKind::DeviceCommand, &msg))
    } else {
        Ok(())
    }
}

/// Boolean bound to masked bits in state register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    name: String,
    location: RegisterLocation,
    mask: u32,
    commit: CommitStrobe,
    cached: Option<bool>,
}

impl Switch {
    pub fn new(
        name: &str,
        location: RegisterLocation,
        mask: u32,
        commit: CommitStrobe,
    ) -> Result<Self, Error> {
        check_name(name)?;
        check_quadlet(&location)?;
        if mask == 0 {
            let msg = format!("Switch {} has no bit in mask", name);
            Err(Error::new(ErrorKind::Usage, &msg))?
        }

        Ok(Self {
            name: name.to_string(),
            location,
            mask,
            commit,
            cached: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &RegisterLocation {
        &self.location
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// The state committed successfully at last.
    pub fn cached(&self) -> Option<bool> {
        self.cached
    }

    /// Read the state register.
    pub fn get<A: RegisterAccess + ?Sized>(&self, gateway: &mut A) -> Result<bool, Error> {
        read_location(gateway, &self.location).map(|val| val & self.mask == self.mask)
    }

    /// Update the masked bits, then commit the change. The bits out of the mask are preserved.
    pub fn set<A: RegisterAccess + ?Sized>(
        &mut self,
        gateway: &mut A,
        state: bool,
    ) -> Result<(), Error> {
        let curr = read_location(gateway, &self.location)?;
        let val = if state {
            curr | self.mask
        } else {
            curr & !self.mask
        };
        write_and_verify(gateway, &self.location, val, self.mask)?;
        self.commit.fire(gateway)?;
        self.cached = Some(state);
        Ok(())
    }
}

/// Sub-field of packed register with two channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VolumeLeg {
    /// Lower byte.
    Left,
    /// The next byte.
    Right,
}

impl VolumeLeg {
    const WIDTH: u32 = 8;
    const FIELD_MASK: u32 = 0xff;

    /// The leg for the index of channel.
    pub fn from_index(index: usize) -> Self {
        if index % 2 > 0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    fn shift(&self) -> u32 {
        match self {
            Self::Left => 0,
            Self::Right => Self::WIDTH,
        }
    }

    fn mask(&self) -> u32 {
        Self::FIELD_MASK << self.shift()
    }
}

/// Meaning of the value in the register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VolumeScale {
    /// The value is the level as is.
    Level,
    /// The value is attenuation from the maximum level.
    Attenuation,
}

/// Integer level bound to a leg of packed register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeControl {
    name: String,
    location: RegisterLocation,
    leg: VolumeLeg,
    range: RangeInclusive<i32>,
    scale: VolumeScale,
    commit: CommitStrobe,
    cached: Option<i32>,
}

impl VolumeControl {
    pub fn new(
        name: &str,
        location: RegisterLocation,
        leg: VolumeLeg,
        range: RangeInclusive<i32>,
        scale: VolumeScale,
        commit: CommitStrobe,
    ) -> Result<Self, Error> {
        check_name(name)?;
        check_quadlet(&location)?;
        if range.is_empty() || *range.start() < 0 || *range.end() > VolumeLeg::FIELD_MASK as i32 {
            let msg = format!("Range {:?} of {} exceeds leg of register", range, name);
            Err(Error::new(ErrorKind::Usage, &msg))?
        }

        Ok(Self {
            name: name.to_string(),
            location,
            leg,
            range,
            scale,
            commit,
            cached: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &RegisterLocation {
        &self.location
    }

    pub fn leg(&self) -> VolumeLeg {
        self.leg
    }

    pub fn range(&self) -> &RangeInclusive<i32> {
        &self.range
    }

    /// The level committed successfully at last.
    pub fn cached(&self) -> Option<i32> {
        self.cached
    }

    fn level_to_field(&self, level: i32) -> u32 {
        match self.scale {
            VolumeScale::Level => level as u32,
            VolumeScale::Attenuation => (*self.range.end() - level) as u32,
        }
    }

    fn field_to_level(&self, field: u32) -> i32 {
        let level = match self.scale {
            VolumeScale::Level => field as i32,
            VolumeScale::Attenuation => *self.range.end() - field as i32,
        };
        level.clamp(*self.range.start(), *self.range.end())
    }

    /// Read the packed register and extract the leg.
    pub fn get<A: RegisterAccess + ?Sized>(&self, gateway: &mut A) -> Result<i32, Error> {
        let val = read_location(gateway, &self.location)?;
        Ok(self.field_to_level((val & self.leg.mask()) >> self.leg.shift()))
    }

    /// Replace the leg in the packed register, then commit the change. The other leg is
    /// preserved.
    pub fn set<A: RegisterAccess + ?Sized>(
        &mut self,
        gateway: &mut A,
        level: i32,
    ) -> Result<(), Error> {
        if !self.range.contains(&level) {
            let msg = format!(
                "Level {} of {} is out of range {:?}",
                level, self.name, self.range
            );
            Err(Error::new(ErrorKind::Usage, &msg))?
        }

        let mask = self.leg.mask();
        let curr = read_location(gateway, &self.location)?;
        let val = (curr & !mask) | ((self.level_to_field(level) << self.leg.shift()) & mask);
        write_and_verify(gateway, &self.location, val, mask)?;
        self.commit.fire(gateway)?;
        self.cached = Some(level);
        Ok(())
    }
}

/// Element in the tree of controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlElement {
    Container(Container),
    Switch(Switch),
    Volume(VolumeControl),
}

impl ControlElement {
    pub fn name(&self) -> &str {
        match self {
            Self::Container(elem) => elem.name(),
            Self::Switch(elem) => elem.name(),
            Self::Volume(elem) => elem.name(),
        }
    }
}

impl fmt::Display for ControlElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Container(elem) => write!(f, "container with {} elements", elem.children.len()),
            Self::Switch(elem) => write!(
                f,
                "switch at {:?}:0x{:04x}, mask 0x{:08x}",
                elem.location.space(),
                elem.location.offset(),
                elem.mask
            ),
            Self::Volume(elem) => write!(
                f,
                "volume at {:?}:0x{:04x}, {:?} leg, {}..={}",
                elem.location.space(),
                elem.location.offset(),
                elem.leg,
                elem.range.start(),
                elem.range.end()
            ),
        }
    }
}

impl From<Container> for ControlElement {
    fn from(elem: Container) -> Self {
        Self::Container(elem)
    }
}

impl From<Switch> for ControlElement {
    fn from(elem: Switch) -> Self {
        Self::Switch(elem)
    }
}

impl From<VolumeControl> for ControlElement {
    fn from(elem: VolumeControl) -> Self {
        Self::Volume(elem)
    }
}

/// Ordered and named collection of elements. The name of each child is unique in the
/// collection.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Container {
    name: String,
    children: Vec<ControlElement>,
}

impl Container {
    /// Root of tree has no name.
    pub fn root() -> Self {
        Default::default()
    }

    pub fn new(name: &str) -> Result<Self, Error> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            children: Default::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[ControlElement] {
        &self.children
    }

    /// Append the element. The element with the same name as the existing one is rejected.
    pub fn add_element<T: Into<ControlElement>>(&mut self, elem: T) -> Result<(), Error> {
        let elem = elem.into();
        if self.children.iter().any(|child| child.name() == elem.name()) {
            let msg = format!(
                "Element {} already exists in '{}'",
                elem.name(),
                self.name
            );
            Err(Error::new(ErrorKind::Usage, &msg))?
        }
        self.children.push(elem);
        Ok(())
    }

    /// Full paths of descendant elements in order of depth-first traversal.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths("", &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &str, paths: &mut Vec<String>) {
        self.children.iter().for_each(|child| {
            let path = format!("{}/{}", prefix, child.name());
            paths.push(path.clone());
            if let ControlElement::Container(container) = child {
                container.collect_paths(&path, paths);
            }
        });
    }

    /// Find the descendant element by its path; e.g. `/output-group/mute`.
    pub fn find(&self, path: &str) -> Option<&ControlElement> {
        let mut names = path.trim_start_matches('/').split('/');
        let first = names.next()?;
        let mut elem = self.children.iter().find(|child| child.name() == first)?;
        for name in names {
            elem = match elem {
                ControlElement::Container(container) => {
                    container.children.iter().find(|child| child.name() == name)?
                }
                _ => return None,
            };
        }
        Some(elem)
    }

    /// Find the descendant element by its path for mutation.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut ControlElement> {
        let mut names = path.trim_start_matches('/').split('/');
        let first = names.next()?;
        let mut elem = self.children.iter_mut().find(|child| child.name() == first)?;
        for name in names {
            elem = match elem {
                ControlElement::Container(container) => container
                    .children
                    .iter_mut()
                    .find(|child| child.name() == name)?,
                _ => return None,
            };
        }
        Some(elem)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const STATE_OFFSET: usize = 0x10;
    const MSG_OFFSET: usize = 0x40;

    fn strobe(value: u32) -> CommitStrobe {
        CommitStrobe::new(
            RegisterLocation::quadlet(AddressSpace::Application, MSG_OFFSET).unwrap(),
            value,
        )
    }

    fn state_location() -> RegisterLocation {
        RegisterLocation::quadlet(AddressSpace::Application, STATE_OFFSET).unwrap()
    }

    fn volume(leg: VolumeLeg) -> VolumeControl {
        VolumeControl::new(
            "volume-1",
            state_location(),
            leg,
            0..=0x7f,
            VolumeScale::Level,
            strobe(0x1),
        )
        .unwrap()
    }

    #[test]
    fn switch_preserves_bits_out_of_mask() {
        let mut regs = TestRegisters::new();
        regs.set(AddressSpace::Application, STATE_OFFSET, 0xa5a5a5a0);
        let mut switch = Switch::new("mute", state_location(), 0x00000004, strobe(0x2)).unwrap();

        switch.set(&mut regs, true).unwrap();
        assert!(switch.get(&mut regs).unwrap());
        assert_eq!(switch.cached(), Some(true));
        assert_eq!(regs.get(AddressSpace::Application, STATE_OFFSET), 0xa5a5a5a4);

        switch.set(&mut regs, false).unwrap();
        assert!(!switch.get(&mut regs).unwrap());
        assert_eq!(regs.get(AddressSpace::Application, STATE_OFFSET), 0xa5a5a5a0);
    }

    #[test]
    fn payload_precedes_commit() {
        let mut regs = TestRegisters::new();
        let mut switch = Switch::new("dim", state_location(), 0x1, strobe(0x2)).unwrap();
        switch.set(&mut regs, true).unwrap();
        assert_eq!(
            regs.writes(),
            vec![
                (AddressSpace::Application, STATE_OFFSET, 0x1),
                (AddressSpace::Application, MSG_OFFSET, 0x2),
            ]
        );
    }

    #[test]
    fn failure_keeps_cache() {
        let mut regs = TestRegisters::new();
        let mut switch = Switch::new("dim", state_location(), 0x1, strobe(0x2)).unwrap();
        switch.set(&mut regs, true).unwrap();

        regs.failed_writes
            .push((AddressSpace::Application, MSG_OFFSET));
        let err = switch.set(&mut regs, false).unwrap_err();
        assert!(err.is(ErrorKind::DeviceCommand));
        assert_eq!(switch.cached(), Some(true));

        let mut vol = volume(VolumeLeg::Left);
        regs.failed_reads
            .push((AddressSpace::Application, STATE_OFFSET));
        let err = vol.set(&mut regs, 0x10).unwrap_err();
        assert!(err.is(ErrorKind::DeviceCommand));
        assert_eq!(vol.cached(), None);
    }

    #[test]
    fn payload_not_held() {
        let mut regs = TestRegisters::new();
        regs.ignored_writes
            .push((AddressSpace::Application, STATE_OFFSET));
        let mut switch = Switch::new("dim", state_location(), 0x1, strobe(0x2)).unwrap();
        let err = switch.set(&mut regs, true).unwrap_err();
        assert!(err.is(ErrorKind::DeviceCommand));
        assert_eq!(switch.cached(), None);
        // The commit is not written.
        assert!(regs
            .writes()
            .iter()
            .all(|&(_, offset, _)| offset != MSG_OFFSET));
    }

    #[test]
    fn volume_leg_isolation() {
        let mut regs = TestRegisters::new();
        regs.set(AddressSpace::Application, STATE_OFFSET, 0xdead0000);
        let mut left = volume(VolumeLeg::Left);
        let mut right = volume(VolumeLeg::Right);

        left.set(&mut regs, 0x12).unwrap();
        right.set(&mut regs, 0x7f).unwrap();
        assert_eq!(left.get(&mut regs).unwrap(), 0x12);
        assert_eq!(right.get(&mut regs).unwrap(), 0x7f);
        assert_eq!(regs.get(AddressSpace::Application, STATE_OFFSET), 0xdead7f12);

        left.set(&mut regs, 0x00).unwrap();
        assert_eq!(right.get(&mut regs).unwrap(), 0x7f);
        assert_eq!(left.cached(), Some(0x00));
    }

    #[test]
    fn volume_round_trip() {
        let mut regs = TestRegisters::new();
        let mut vol = volume(VolumeLeg::Right);
        (0..=0x7f).for_each(|level| {
            vol.set(&mut regs, level).unwrap();
            assert_eq!(vol.get(&mut regs).unwrap(), level);
        });

        let err = vol.set(&mut regs, 0x80).unwrap_err();
        assert!(err.is(ErrorKind::Usage));
        assert_eq!(vol.cached(), Some(0x7f));
    }

    #[test]
    fn volume_as_attenuation() {
        let mut regs = TestRegisters::new();
        let mut vol = VolumeControl::new(
            "volume-2",
            state_location(),
            VolumeLeg::Right,
            0..=0x7f,
            VolumeScale::Attenuation,
            strobe(0x1),
        )
        .unwrap();
        vol.set(&mut regs, 0x70).unwrap();
        assert_eq!(regs.get(AddressSpace::Application, STATE_OFFSET), 0x00000f00);
        assert_eq!(vol.get(&mut regs).unwrap(), 0x70);
    }

    #[test]
    fn container_paths() {
        let mut root = Container::root();
        let mut group = Container::new("output-group").unwrap();
        group
            .add_element(Switch::new("mute", state_location(), 0x1, strobe(0x2)).unwrap())
            .unwrap();
        group.add_element(volume(VolumeLeg::Left)).unwrap();
        let err = group
            .add_element(Switch::new("mute", state_location(), 0x2, strobe(0x2)).unwrap())
            .unwrap_err();
        assert!(err.is(ErrorKind::Usage));
        root.add_element(group).unwrap();

        assert_eq!(
            root.paths(),
            vec!["/output-group", "/output-group/mute", "/output-group/volume-1"]
        );
        assert!(matches!(
            root.find("/output-group/mute"),
            Some(ControlElement::Switch(_))
        ));
        assert!(matches!(
            root.find_mut("output-group/volume-1"),
            Some(ControlElement::Volume(_))
        ));
        assert!(root.find("/output-group/mute/x").is_none());
        assert!(root.find("/input").is_none());

        assert!(Container::new("a/b").is_err());
    }
}
