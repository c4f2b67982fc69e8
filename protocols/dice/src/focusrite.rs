// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Protocol specific to Focusrite Saffire Pro series.
//!
//! The module includes structure, enumeration, and trait and its implementation for protocol
//! defined by Focusrite for Saffire Pro series. The parameters of output group and inputs are
//! in application section, and the change of them is notified to the unit by software notice.

pub mod spro14;
pub mod spro24;
pub mod spro26;
pub mod spro40;

use {
    super::{control::*, register::*, router::*, *},
    spro14::SPro14Protocol,
    spro24::SPro24Protocol,
    spro26::SPro26Protocol,
    spro40::SPro40Protocol,
};

/// Physical input port.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Input {
    pub id: SrcBlkId,
    pub offset: u8,
    pub count: u8,
    pub label: Option<&'static str>,
}

/// Physical output port.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Output {
    pub id: DstBlkId,
    pub offset: u8,
    pub count: u8,
    pub label: Option<&'static str>,
}

/// Declaration of endpoint for routing model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDecl<T> {
    pub name: String,
    pub category: T,
    pub base: u8,
    pub count: u8,
}

/// The number of ADAT channels in each mode.
const ADAT_CHANNEL_COUNTS: [u8; 3] = [8, 4, 2];

/// The number of mixer outputs in each mode.
const MIXER_OUT_PORT_COUNTS: [u8; 3] = [16, 16, 8];

/// Mixer inputs.
const MIXER_IN_PORTS: [(DstBlkId, u8); 2] = [(DstBlkId::MixerTx0, 16), (DstBlkId::MixerTx1, 2)];

/// The specification of router.
pub trait SaffireproRouterSpecification {
    /// Physical inputs.
    const INPUTS: &'static [Input];

    /// Physical outputs.
    const OUTPUTS: &'static [Output];

    /// Supported modes of sampling transfer frequency.
    const RATE_MODES: &'static [RateMode];

    /// The number of channels in transmitted streams (stream 0 and 1) for each mode.
    const TX_STREAM_CHANNELS: [[u8; 2]; 3];

    /// The number of channels in received streams (stream 0 and 1) for each mode.
    const RX_STREAM_CHANNELS: [[u8; 2]; 3];

    /// The maximum number of entries in router section.
    const ROUTER_ENTRY_CAPACITY: usize = 128;

    /// Sources whose routes should be at the head of router section in the order, e.g. for
    /// hardware metering.
    const FIXED: &'static [SrcBlk] = &[];

    /// Default routes in the mode.
    fn default_routes(rate_mode: RateMode) -> Vec<Route>
    where
        Self: Sized,
    {
        default_routes_in_port_order::<Self>(rate_mode)
    }
}

fn adat_channel_count(rate_mode: RateMode) -> u8 {
    ADAT_CHANNEL_COUNTS[rate_mode.index()]
}

fn input_name(input: &Input) -> &'static str {
    input.label.unwrap_or(match input.id {
        SrcBlkId::Aes => "S/PDIF",
        SrcBlkId::Adat => "ADAT",
        _ => "Analog",
    })
}

fn output_name(output: &Output) -> &'static str {
    output.label.unwrap_or(match output.id {
        DstBlkId::Aes => "S/PDIF",
        DstBlkId::Adat => "ADAT",
        _ => "Analog",
    })
}

fn input_count(input: &Input, rate_mode: RateMode) -> u8 {
    if input.id == SrcBlkId::Adat {
        adat_channel_count(rate_mode)
    } else {
        input.count
    }
}

fn output_count(output: &Output, rate_mode: RateMode) -> u8 {
    if output.id == DstBlkId::Adat {
        adat_channel_count(rate_mode)
    } else {
        output.count
    }
}

fn stream_name(index: usize) -> &'static str {
    if index == 0 {
        "Stream-A"
    } else {
        "Stream-B"
    }
}

fn physical_sources<T: SaffireproRouterSpecification>(rate_mode: RateMode) -> Vec<SrcBlk> {
    T::INPUTS
        .iter()
        .flat_map(|input| {
            let count = input_count(input, rate_mode);
            (input.offset..(input.offset + count)).map(move |ch| SrcBlk { id: input.id, ch })
        })
        .collect()
}

fn physical_destinations<T: SaffireproRouterSpecification>(rate_mode: RateMode) -> Vec<DstBlk> {
    T::OUTPUTS
        .iter()
        .flat_map(|output| {
            let count = output_count(output, rate_mode);
            (output.offset..(output.offset + count)).map(move |ch| DstBlk { id: output.id, ch })
        })
        .collect()
}

fn tx_stream_destinations<T: SaffireproRouterSpecification>(rate_mode: RateMode) -> Vec<DstBlk> {
    let counts = T::TX_STREAM_CHANNELS[rate_mode.index()];
    [DstBlkId::Avs0, DstBlkId::Avs1]
        .iter()
        .zip(counts)
        .flat_map(|(&id, count)| (0..count).map(move |ch| DstBlk { id, ch }))
        .collect()
}

fn rx_stream_sources<T: SaffireproRouterSpecification>(rate_mode: RateMode) -> Vec<SrcBlk> {
    let counts = T::RX_STREAM_CHANNELS[rate_mode.index()];
    [SrcBlkId::Avs0, SrcBlkId::Avs1]
        .iter()
        .zip(counts)
        .flat_map(|(&id, count)| (0..count).map(move |ch| SrcBlk { id, ch }))
        .collect()
}

fn mixer_destinations() -> Vec<DstBlk> {
    MIXER_IN_PORTS
        .iter()
        .flat_map(|&(id, count)| (0..count).map(move |ch| DstBlk { id, ch }))
        .collect()
}

fn endpoints<T: SaffireproRouterSpecification>(
    rate_mode: RateMode,
) -> (Vec<EndpointDecl<SrcBlkId>>, Vec<EndpointDecl<DstBlkId>>) {
    let mut srcs: Vec<EndpointDecl<SrcBlkId>> = T::INPUTS
        .iter()
        .map(|input| EndpointDecl {
            name: input_name(input).to_string(),
            category: input.id,
            base: input.offset,
            count: input_count(input, rate_mode),
        })
        .collect();

    T::RX_STREAM_CHANNELS[rate_mode.index()]
        .iter()
        .zip([SrcBlkId::Avs0, SrcBlkId::Avs1])
        .enumerate()
        .filter(|(_, (count, _))| **count > 0)
        .for_each(|(i, (&count, id))| {
            srcs.push(EndpointDecl {
                name: stream_name(i).to_string(),
                category: id,
                base: 0,
                count,
            })
        });

    srcs.push(EndpointDecl {
        name: "Mixer".to_string(),
        category: SrcBlkId::Mixer,
        base: 0,
        count: MIXER_OUT_PORT_COUNTS[rate_mode.index()],
    });

    srcs.push(EndpointDecl {
        name: "Mute".to_string(),
        category: SrcBlkId::Mute,
        base: 0,
        count: 1,
    });

    let mut dsts: Vec<EndpointDecl<DstBlkId>> = T::OUTPUTS
        .iter()
        .map(|output| EndpointDecl {
            name: output_name(output).to_string(),
            category: output.id,
            base: output.offset,
            count: output_count(output, rate_mode),
        })
        .collect();

    T::TX_STREAM_CHANNELS[rate_mode.index()]
        .iter()
        .zip([DstBlkId::Avs0, DstBlkId::Avs1])
        .enumerate()
        .filter(|(_, (count, _))| **count > 0)
        .for_each(|(i, (&count, id))| {
            dsts.push(EndpointDecl {
                name: stream_name(i).to_string(),
                category: id,
                base: 0,
                count,
            })
        });

    MIXER_IN_PORTS.iter().for_each(|&(id, count)| {
        dsts.push(EndpointDecl {
            name: "Mixer".to_string(),
            category: id,
            base: 0,
            count,
        })
    });

    (srcs, dsts)
}

// Physical inputs to transmitted streams, received streams to physical outputs, then physical
// inputs to mixer inputs. The rest of physical outputs are muted.
fn default_routes_in_port_order<T: SaffireproRouterSpecification>(
    rate_mode: RateMode,
) -> Vec<Route> {
    let phys_srcs = physical_sources::<T>(rate_mode);
    let phys_dsts = physical_destinations::<T>(rate_mode);
    let rx_srcs = rx_stream_sources::<T>(rate_mode);

    let mut routes: Vec<Route> = phys_srcs
        .iter()
        .zip(tx_stream_destinations::<T>(rate_mode))
        .map(|(&src, dst)| Route { src, dst })
        .collect();

    let mute = SrcBlk {
        id: SrcBlkId::Mute,
        ch: 0,
    };
    phys_dsts.iter().enumerate().for_each(|(i, &dst)| {
        let src = rx_srcs.get(i).copied().unwrap_or(mute);
        routes.push(Route { src, dst });
    });

    phys_srcs
        .iter()
        .zip(mixer_destinations())
        .for_each(|(&src, dst)| routes.push(Route { src, dst }));

    routes
}

/// Software notice protocol to update hardware parameter.
pub trait SaffireproSwNoticeSpecification {
    /// Offset of software notice in application section.
    const SW_NOTICE_OFFSET: usize;
}

fn sw_notice<T: SaffireproSwNoticeSpecification>(notice: u32) -> Result<CommitStrobe, Error> {
    RegisterLocation::quadlet(AddressSpace::Application, T::SW_NOTICE_OFFSET)
        .map(|location| CommitStrobe::new(location, notice))
}

/// The maximum value of volume in output group.
pub const OUT_GROUP_VOL_MAX: i32 = 0x7f;

const MUTE_ENABLED_OFFSET: usize = 0x00;
const DIM_ENABLED_OFFSET: usize = 0x04;
const VOLS_OFFSET: usize = 0x08;
const VOL_MUTE_HWCTLS_OFFSET: usize = 0x1c;
const MUTE_DIM_HWCTLS_OFFSET: usize = 0x30;
const DIM_LEVEL_OFFSET: usize = 0x4c;

const MUTE_HWCTL_SHIFT: usize = 0;
const DIM_HWCTL_SHIFT: usize = 10;

/// The specification of output group. Output volumes corresponding to the entries are
/// controlled by single software/hardware operation if enabled.
pub trait SaffireproOutGroupSpecification: SaffireproSwNoticeSpecification {
    /// Offset of output group state.
    const OUT_GROUP_STATE_OFFSET: usize;

    /// The number of outputs to be controlled.
    const ENTRY_COUNT: usize;

    /// Support hardware knob to control volume.
    const HAS_VOL_HWCTL: bool;

    /// Support the level of dim. The quadlet just after output group is used for the other
    /// purpose if not.
    const HAS_DIM_LEVEL: bool = false;

    /// Software notification for source of output group.
    const SRC_NOTICE: u32;

    /// Software notification for dim and mute of output group.
    const DIM_MUTE_NOTICE: u32;
}

fn out_group_location<T: SaffireproOutGroupSpecification>(
    offset: usize,
) -> Result<RegisterLocation, Error> {
    RegisterLocation::quadlet(AddressSpace::Application, T::OUT_GROUP_STATE_OFFSET + offset)
}

fn build_out_group<T: SaffireproOutGroupSpecification>() -> Result<Container, Error> {
    let mut group = Container::new("output-group")?;

    let dim_mute = sw_notice::<T>(T::DIM_MUTE_NOTICE)?;
    let src = sw_notice::<T>(T::SRC_NOTICE)?;

    group.add_element(Switch::new(
        "mute",
        out_group_location::<T>(MUTE_ENABLED_OFFSET)?,
        0x00000001,
        dim_mute,
    )?)?;
    group.add_element(Switch::new(
        "dim",
        out_group_location::<T>(DIM_ENABLED_OFFSET)?,
        0x00000001,
        dim_mute,
    )?)?;

    (0..T::ENTRY_COUNT).try_for_each(|i| {
        let pos = (i / 2) * QUADLET_SIZE;
        group.add_element(VolumeControl::new(
            &format!("volume-{}", i + 1),
            out_group_location::<T>(VOLS_OFFSET + pos)?,
            VolumeLeg::from_index(i),
            0..=OUT_GROUP_VOL_MAX,
            VolumeScale::Attenuation,
            src,
        )?)?;

        let location = out_group_location::<T>(VOL_MUTE_HWCTLS_OFFSET + pos)?;
        group.add_element(Switch::new(
            &format!("volume-mute-{}", i + 1),
            location,
            1 << ((i % 2) + 2),
            src,
        )?)?;

        if T::HAS_VOL_HWCTL {
            group.add_element(Switch::new(
                &format!("volume-hwctl-{}", i + 1),
                location,
                1 << (i % 2),
                src,
            )?)?;
        }

        Ok::<(), Error>(())
    })?;

    // Assignment of each output to hardware mute and dim buttons.
    let location = out_group_location::<T>(MUTE_DIM_HWCTLS_OFFSET)?;
    (0..T::ENTRY_COUNT).try_for_each(|i| {
        group.add_element(Switch::new(
            &format!("mute-hwctl-{}", i + 1),
            location,
            1 << (i + MUTE_HWCTL_SHIFT),
            src,
        )?)?;
        group.add_element(Switch::new(
            &format!("dim-hwctl-{}", i + 1),
            location,
            1 << (i + DIM_HWCTL_SHIFT),
            src,
        )?)
    })?;

    if T::HAS_DIM_LEVEL {
        group.add_element(VolumeControl::new(
            "dim-level",
            out_group_location::<T>(DIM_LEVEL_OFFSET)?,
            VolumeLeg::Left,
            0..=OUT_GROUP_VOL_MAX,
            VolumeScale::Attenuation,
            src,
        )?)?;
    }

    Ok(group)
}

const MIC_INPUT_LEVEL_INSTRUMENT_FLAG: u32 = 0x0002;
const LINE_INPUT_LEVEL_HIGH_FLAG: u32 = 0x0001;

const MIC_PARAMS_OFFSET: usize = 0x00;
const LINE_PARAMS_OFFSET: usize = 0x04;

/// The specification of input parameters.
pub trait SaffireproInputSpecification: SaffireproSwNoticeSpecification {
    /// Offset of input parameters.
    const INPUT_PARAMS_OFFSET: usize;

    /// Software notification for input parameters.
    const SW_NOTICE: u32 = 0x00000004;

    const MIC_INPUT_COUNT: usize = 2;
    const LINE_INPUT_COUNT: usize = 2;
}

fn build_input<T: SaffireproInputSpecification>() -> Result<Container, Error> {
    let mut input = Container::new("input")?;
    let notice = sw_notice::<T>(<T as SaffireproInputSpecification>::SW_NOTICE)?;

    let mic_location = RegisterLocation::quadlet(
        AddressSpace::Application,
        T::INPUT_PARAMS_OFFSET + MIC_PARAMS_OFFSET,
    )?;
    (0..T::MIC_INPUT_COUNT).try_for_each(|i| {
        input.add_element(Switch::new(
            &format!("mic-{}-instrument", i + 1),
            mic_location,
            MIC_INPUT_LEVEL_INSTRUMENT_FLAG << (16 * i),
            notice,
        )?)
    })?;

    let line_location = RegisterLocation::quadlet(
        AddressSpace::Application,
        T::INPUT_PARAMS_OFFSET + LINE_PARAMS_OFFSET,
    )?;
    (0..T::LINE_INPUT_COUNT).try_for_each(|i| {
        input.add_element(Switch::new(
            &format!("line-{}-high", i + 1),
            line_location,
            LINE_INPUT_LEVEL_HIGH_FLAG << (16 * i),
            notice,
        )?)
    })?;

    Ok(input)
}

/// Supported models.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    /// Saffire Pro 40.
    SPro40,
    /// Saffire Pro 24.
    SPro24,
    /// Saffire Pro 26.
    SPro26,
    /// Saffire Pro 14.
    SPro14,
}

impl DeviceModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SPro40 => "Saffire Pro 40",
            Self::SPro24 => "Saffire Pro 24",
            Self::SPro26 => "Saffire Pro 26",
            Self::SPro14 => "Saffire Pro 14",
        }
    }

    /// Whether the mode of sampling transfer frequency is supported.
    pub fn is_supported(&self, rate_mode: RateMode) -> bool {
        let modes = match self {
            Self::SPro40 => SPro40Protocol::RATE_MODES,
            Self::SPro24 => SPro24Protocol::RATE_MODES,
            Self::SPro26 => SPro26Protocol::RATE_MODES,
            Self::SPro14 => SPro14Protocol::RATE_MODES,
        };
        modes.contains(&rate_mode)
    }

    /// The maximum number of entries in router section.
    pub fn router_entry_capacity(&self) -> usize {
        match self {
            Self::SPro40 => SPro40Protocol::ROUTER_ENTRY_CAPACITY,
            Self::SPro24 => SPro24Protocol::ROUTER_ENTRY_CAPACITY,
            Self::SPro26 => SPro26Protocol::ROUTER_ENTRY_CAPACITY,
            Self::SPro14 => SPro14Protocol::ROUTER_ENTRY_CAPACITY,
        }
    }

    /// Sources whose routes should be at the head of router section in the order.
    pub fn fixed_sources(&self) -> &'static [SrcBlk] {
        match self {
            Self::SPro40 => SPro40Protocol::FIXED,
            Self::SPro24 => SPro24Protocol::FIXED,
            Self::SPro26 => SPro26Protocol::FIXED,
            Self::SPro14 => SPro14Protocol::FIXED,
        }
    }

    /// Endpoints of sources and destinations in the mode.
    pub fn endpoints(
        &self,
        rate_mode: RateMode,
    ) -> (Vec<EndpointDecl<SrcBlkId>>, Vec<EndpointDecl<DstBlkId>>) {
        match self {
            Self::SPro40 => endpoints::<SPro40Protocol>(rate_mode),
            Self::SPro24 => endpoints::<SPro24Protocol>(rate_mode),
            Self::SPro26 => endpoints::<SPro26Protocol>(rate_mode),
            Self::SPro14 => endpoints::<SPro14Protocol>(rate_mode),
        }
    }

    /// Default routes in the mode. Saffire Pro 26 has its own fixed order. The others route
    /// physical inputs to transmitted streams, received streams to physical outputs, physical
    /// inputs to mixer inputs, and mute to the rest of physical outputs.
    pub fn default_routes(&self, rate_mode: RateMode) -> Vec<Route> {
        match self {
            Self::SPro40 => SPro40Protocol::default_routes(rate_mode),
            Self::SPro24 => SPro24Protocol::default_routes(rate_mode),
            Self::SPro26 => SPro26Protocol::default_routes(rate_mode),
            Self::SPro14 => SPro14Protocol::default_routes(rate_mode),
        }
    }

    /// Build the tree of control elements.
    pub fn build_control_tree(&self) -> Result<Container, Error> {
        let mut root = Container::root();
        match self {
            Self::SPro40 => {
                root.add_element(build_out_group::<SPro40Protocol>()?)?;
            }
            Self::SPro24 => {
                root.add_element(build_out_group::<SPro24Protocol>()?)?;
                root.add_element(build_input::<SPro24Protocol>()?)?;
            }
            Self::SPro26 => {
                root.add_element(build_out_group::<SPro26Protocol>()?)?;
            }
            Self::SPro14 => {
                root.add_element(build_out_group::<SPro14Protocol>()?)?;
                root.add_element(build_input::<SPro14Protocol>()?)?;
            }
        }
        Ok(root)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn adat_shrinks_at_higher_rate() {
        let count = |mode| {
            physical_sources::<SPro40Protocol>(mode)
                .iter()
                .filter(|src| src.id == SrcBlkId::Adat)
                .count()
        };
        assert_eq!(count(RateMode::Low), 8);
        assert_eq!(count(RateMode::Middle), 4);
        assert_eq!(count(RateMode::High), 2);
    }

    #[test]
    fn default_routes_of_spro40() {
        let routes = DeviceModel::SPro40.default_routes(RateMode::Low);

        // Physical outputs more than received stream channels are muted.
        let muted: Vec<DstBlk> = routes
            .iter()
            .filter(|route| route.src.id == SrcBlkId::Mute)
            .map(|route| route.dst)
            .collect();
        assert_eq!(
            muted,
            vec![
                DstBlk {
                    id: DstBlkId::Aes,
                    ch: 4
                },
                DstBlk {
                    id: DstBlkId::Aes,
                    ch: 5
                },
            ]
        );

        let mixer_inputs = routes
            .iter()
            .filter(|route| {
                route.dst.id == DstBlkId::MixerTx0 || route.dst.id == DstBlkId::MixerTx1
            })
            .count();
        assert_eq!(mixer_inputs, 18);
    }

    #[test]
    fn endpoints_of_spro24() {
        let (srcs, dsts) = DeviceModel::SPro24.endpoints(RateMode::Middle);
        assert_eq!(srcs[0].name, "Mic");
        assert_eq!(srcs[0].base, 2);
        assert!(srcs
            .iter()
            .any(|src| src.category == SrcBlkId::Adat && src.count == 4));
        assert!(!srcs.iter().any(|src| src.category == SrcBlkId::Avs1));
        assert!(dsts
            .iter()
            .any(|dst| dst.category == DstBlkId::MixerTx1 && dst.name == "Mixer"));
    }

    #[test]
    fn control_tree_of_spro40() {
        let tree = DeviceModel::SPro40.build_control_tree().unwrap();
        let paths = tree.paths();
        assert!(paths.contains(&"/output-group/mute".to_string()));
        assert!(paths.contains(&"/output-group/volume-10".to_string()));
        assert!(paths.contains(&"/output-group/volume-hwctl-10".to_string()));
        assert!(!paths.iter().any(|path| path.starts_with("/input")));

        match tree.find("/output-group/volume-mute-4") {
            Some(ControlElement::Switch(switch)) => {
                assert_eq!(switch.location().offset(), 0x0c + 0x1c + 0x04);
                assert_eq!(switch.mask(), 0x00000008);
            }
            _ => unreachable!(),
        }

        match tree.find("/output-group/volume-3") {
            Some(ControlElement::Volume(vol)) => {
                assert_eq!(vol.location().offset(), 0x0c + 0x08 + 0x04);
                assert_eq!(vol.leg(), VolumeLeg::Left);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn control_tree_of_spro26() {
        let tree = DeviceModel::SPro26.build_control_tree().unwrap();
        let paths = tree.paths();
        assert!(paths.contains(&"/output-group/volume-6".to_string()));
        assert!(!paths.contains(&"/output-group/volume-7".to_string()));
        assert!(!paths.iter().any(|path| path.contains("volume-hwctl")));
        assert!(!paths.iter().any(|path| path.starts_with("/input")));

        match tree.find("/output-group/mute-hwctl-3") {
            Some(ControlElement::Switch(switch)) => {
                assert_eq!(switch.location().offset(), 0x10 + 0x30);
                assert_eq!(switch.mask(), 0x00000004);
            }
            _ => unreachable!(),
        }

        match tree.find("/output-group/dim-hwctl-6") {
            Some(ControlElement::Switch(switch)) => {
                assert_eq!(switch.location().offset(), 0x10 + 0x30);
                assert_eq!(switch.mask(), 0x00008000);
            }
            _ => unreachable!(),
        }

        match tree.find("/output-group/dim-level") {
            Some(ControlElement::Volume(vol)) => {
                assert_eq!(vol.location().offset(), 0x10 + 0x4c);
                assert_eq!(vol.leg(), VolumeLeg::Left);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn monitor_switches_share_register() {
        let tree = DeviceModel::SPro40.build_control_tree().unwrap();
        let masks: Vec<u32> = (1..=10)
            .flat_map(|i| {
                let mute = format!("/output-group/mute-hwctl-{}", i);
                let dim = format!("/output-group/dim-hwctl-{}", i);
                vec![mute, dim]
            })
            .map(|path| match tree.find(&path) {
                Some(ControlElement::Switch(switch)) => {
                    assert_eq!(switch.location().offset(), 0x0c + 0x30);
                    switch.mask()
                }
                _ => unreachable!(),
            })
            .collect();
        // Each bit is assigned to one switch.
        let union = masks.iter().fold(0, |union, &mask| {
            assert_eq!(union & mask, 0);
            union | mask
        });
        assert_eq!(union, 0x000ffc00 | 0x000003ff);
        assert!(tree.find("/output-group/dim-level").is_some());
        assert!(DeviceModel::SPro24
            .build_control_tree()
            .unwrap()
            .find("/output-group/dim-level")
            .is_none());
    }

    #[test]
    fn default_routes_of_spro26() {
        assert!(!DeviceModel::SPro26.is_supported(RateMode::High));
        let routes = DeviceModel::SPro26.default_routes(RateMode::Low);
        let fixed = DeviceModel::SPro26.fixed_sources();
        assert_eq!(fixed.len(), 6);
        routes
            .iter()
            .zip(fixed)
            .for_each(|(route, &src)| assert_eq!(route.src, src));

        let (srcs, _) = DeviceModel::SPro26.endpoints(RateMode::Middle);
        assert!(srcs
            .iter()
            .any(|src| src.name == "S/PDIF-opt" && src.base == 6));
        assert!(srcs
            .iter()
            .any(|src| src.category == SrcBlkId::Adat && src.count == 4));
        assert!(DeviceModel::SPro40.fixed_sources().is_empty());
    }

    #[test]
    fn control_tree_of_spro14() {
        let tree = DeviceModel::SPro14.build_control_tree().unwrap();
        let paths = tree.paths();
        assert!(paths.contains(&"/output-group/volume-4".to_string()));
        assert!(!paths.contains(&"/output-group/volume-5".to_string()));
        assert!(!paths.iter().any(|path| path.contains("volume-hwctl")));
        assert!(!paths.contains(&"/output-group/dim-level".to_string()));

        match tree.find("/input/line-2-high") {
            Some(ControlElement::Switch(switch)) => {
                assert_eq!(switch.location().offset(), 0x5c + 0x04);
                assert_eq!(switch.mask(), 0x00010000);
            }
            _ => unreachable!(),
        }
    }
}
