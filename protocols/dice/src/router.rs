// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Routing model for the router of DICE.
//!
//! The module includes structure, enumeration, and its implementation for source and destination
//! endpoints and table of routes. Each mode of sampling transfer frequency has its own set of
//! endpoints and its own table of routes, since the number of available channels differs between
//! the modes; e.g. ADAT interface transfers less channels at higher rate by S/MUX.

mod entry;

pub use entry::{read_router_entries, RouterEntry};

use {
    super::{command::*, focusrite::*, register::*, *},
    std::{cmp::Ordering, collections::BTreeMap, ops::Range},
    tracing::{debug, warn, Span},
};

/// Mode of sampling transfer frequency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RateMode {
    /// up to 48.0 kHz.
    Low,
    /// up to 96.0 kHz.
    Middle,
    /// up to 192.0 kHz.
    High,
}

impl Default for RateMode {
    fn default() -> Self {
        Self::Low
    }
}

impl RateMode {
    /// The list of modes.
    pub const ALL: [RateMode; 3] = [RateMode::Low, RateMode::Middle, RateMode::High];

    /// Conversion from sampling transfer frequency.
    pub fn from_sampling_transfer_frequency(freq: u32) -> Self {
        match freq {
            0..=48000 => Self::Low,
            48001..=96000 => Self::Middle,
            _ => Self::High,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Middle => 1,
            Self::High => 2,
        }
    }
}

/// Category of source block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SrcBlkId {
    /// AES/EBU or S/PDIF inputs.
    Aes,
    /// ADAT inputs.
    Adat,
    /// Outputs of mixer.
    Mixer,
    /// Analog inputs at InS 0.
    Ins0,
    /// Analog inputs at InS 1.
    Ins1,
    /// Audio from ARM processor.
    ArmAprAudio,
    /// Received isochronous stream 0.
    Avs0,
    /// Received isochronous stream 1.
    Avs1,
    /// Muted constant.
    Mute,
    Reserved(u8),
}

impl Default for SrcBlkId {
    fn default() -> Self {
        SrcBlkId::Reserved(0xff)
    }
}

/// Category of destination block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DstBlkId {
    /// AES/EBU or S/PDIF outputs.
    Aes,
    /// ADAT outputs.
    Adat,
    /// The first inputs of mixer.
    MixerTx0,
    /// The second inputs of mixer.
    MixerTx1,
    /// Analog outputs at InS 0.
    Ins0,
    /// Analog outputs at InS 1.
    Ins1,
    /// Audio to ARM processor.
    ArmApbAudio,
    /// Transmitted isochronous stream 0.
    Avs0,
    /// Transmitted isochronous stream 1.
    Avs1,
    Reserved(u8),
}

impl Default for DstBlkId {
    fn default() -> Self {
        DstBlkId::Reserved(0xff)
    }
}

/// Channel of source block.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SrcBlk {
    pub id: SrcBlkId,
    pub ch: u8,
}

/// Channel of destination block.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DstBlk {
    pub id: DstBlkId,
    pub ch: u8,
}

impl Ord for SrcBlk {
    fn cmp(&self, other: &Self) -> Ordering {
        u8::from(*self).cmp(&u8::from(*other))
    }
}

impl PartialOrd for SrcBlk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DstBlk {
    fn cmp(&self, other: &Self) -> Ordering {
        u8::from(*self).cmp(&u8::from(*other))
    }
}

impl PartialOrd for DstBlk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The maximum number of channels addressable in a block.
pub const BLK_CHANNEL_COUNT: u8 = 16;

/// Numeric identifier of endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(pub u32);

/// Named range of channels in a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint<T> {
    /// Name for display. The same name can be used by several endpoints for sub-ranges of the
    /// same connector.
    pub name: String,
    /// Category.
    pub category: T,
    /// The first channel in the category.
    pub base: u8,
    /// The number of channels.
    pub count: u8,
    /// The offset to number labels of channels.
    pub id_offset: u8,
    /// Numeric identifier.
    pub id: EndpointId,
}

/// Endpoint as source of route.
pub type Source = Endpoint<SrcBlkId>;

/// Endpoint as destination of route.
pub type Destination = Endpoint<DstBlkId>;

impl<T> Endpoint<T> {
    /// The range of channels in the category.
    pub fn channels(&self) -> Range<u8> {
        self.base..self.base.saturating_add(self.count)
    }

    /// Whether the channel is in the endpoint.
    pub fn contains(&self, ch: u8) -> bool {
        self.channels().contains(&ch)
    }

    /// Labels for each channel.
    pub fn labels(&self) -> Vec<String> {
        (0..self.count as usize)
            .map(|i| format!("{} {}", self.name, self.id_offset as usize + i + 1))
            .collect()
    }
}

/// Connection from a channel of source to a channel of destination.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Route {
    pub src: SrcBlk,
    pub dst: DstBlk,
}

/// Table of routes. Each channel of destination has one source at most.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RouteTable(BTreeMap<DstBlk, SrcBlk>);

impl RouteTable {
    /// Insert the route. The route to the same destination is replaced and its source is
    /// returned.
    pub fn insert(&mut self, src: SrcBlk, dst: DstBlk) -> Option<SrcBlk> {
        self.0.insert(dst, src)
    }

    /// The source connected to the destination.
    pub fn source(&self, dst: &DstBlk) -> Option<SrcBlk> {
        self.0.get(dst).copied()
    }

    /// Routes in order of destination.
    pub fn iter(&self) -> impl Iterator<Item = Route> + '_ {
        self.0.iter().map(|(&dst, &src)| Route { src, dst })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }
}

/// Endpoints and routes for a mode of sampling transfer frequency.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub sources: Vec<Source>,
    pub destinations: Vec<Destination>,
    pub routes: RouteTable,
}

/// The result of setup for a mode of sampling transfer frequency.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RouterSetup {
    /// The given number of routes or endpoints are added.
    Applied(usize),
    /// The mode is not supported by the model, thus nothing is added.
    Unsupported,
}

/// Routing model of a unit with endpoints and routes for each mode of sampling transfer
/// frequency.
#[derive(Debug)]
pub struct RouterModel {
    model: DeviceModel,
    rate_mode: RateMode,
    configs: [RouterConfig; 3],
    next_id: u32,
    span: Span,
}

fn check_endpoint(name: &str, count: u8) -> Result<(), Error> {
    if name.is_empty() {
        Err(Error::new(ErrorKind::Usage, "The name of endpoint is empty"))
    } else if count == 0 {
        let msg = format!("Endpoint {} has no channel", name);
        Err(Error::new(ErrorKind::Usage, &msg))
    } else {
        Ok(())
    }
}

// The entries for the fixed sources are moved to the head in the order. The source without
// route is still placed with reserved destination.
fn place_fixed_entries(entries: &mut Vec<RouterEntry>, fixed: &[SrcBlk]) {
    fixed.iter().enumerate().for_each(|(i, &src)| {
        match entries[i..].iter().position(|entry| entry.src == src) {
            Some(pos) => {
                let entry = entries.remove(i + pos);
                entries.insert(i, entry);
            }
            None => entries.insert(
                i,
                RouterEntry {
                    dst: DstBlk {
                        id: DstBlkId::Reserved(0xff),
                        ch: 0xff,
                    },
                    src,
                    ..Default::default()
                },
            ),
        }
    });
}

// Endpoints with the same name continue numbering of labels.
fn next_id_offset<T>(endpoints: &[Endpoint<T>], name: &str) -> Result<u8, Error> {
    endpoints
        .iter()
        .filter(|endpoint| endpoint.name == name)
        .try_fold(0u8, |offset, endpoint| offset.checked_add(endpoint.count))
        .ok_or_else(|| {
            let msg = format!("Too many channels for endpoints named {}", name);
            Error::new(ErrorKind::Usage, &msg)
        })
}

fn check_channel(ch: u8) -> Result<(), Error> {
    if ch >= BLK_CHANNEL_COUNT {
        let msg = format!(
            "Channel {} is out of block, should be less than {}",
            ch, BLK_CHANNEL_COUNT
        );
        Err(Error::new(ErrorKind::Usage, &msg))
    } else {
        Ok(())
    }
}

impl RouterModel {
    /// Instantiate for the model. The span is the context of diagnostics.
    pub fn new(model: DeviceModel, span: Span) -> Self {
        Self {
            model,
            rate_mode: Default::default(),
            configs: Default::default(),
            next_id: 0,
            span,
        }
    }

    pub fn model(&self) -> DeviceModel {
        self.model
    }

    /// The mode currently configured.
    pub fn rate_mode(&self) -> RateMode {
        self.rate_mode
    }

    /// Select the mode to be configured by the following operations.
    pub fn set_rate_mode(&mut self, rate_mode: RateMode) {
        self.rate_mode = rate_mode;
    }

    /// Endpoints and routes for the mode.
    pub fn config(&self, rate_mode: RateMode) -> &RouterConfig {
        &self.configs[rate_mode.index()]
    }

    /// Routes for the mode.
    pub fn routes(&self, rate_mode: RateMode) -> &RouteTable {
        &self.config(rate_mode).routes
    }

    fn current_mut(&mut self) -> &mut RouterConfig {
        &mut self.configs[self.rate_mode.index()]
    }

    fn assign_id(&mut self) -> EndpointId {
        let id = EndpointId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add named range of channels as source in the current mode.
    pub fn add_source(
        &mut self,
        name: &str,
        base: u8,
        count: u8,
        category: SrcBlkId,
        id_offset: u8,
    ) -> Result<EndpointId, Error> {
        check_endpoint(name, count)?;
        let id = self.assign_id();
        self.current_mut().sources.push(Endpoint {
            name: name.to_string(),
            category,
            base,
            count,
            id_offset,
            id,
        });
        Ok(id)
    }

    /// Add named range of channels as destination in the current mode.
    pub fn add_destination(
        &mut self,
        name: &str,
        base: u8,
        count: u8,
        category: DstBlkId,
        id_offset: u8,
    ) -> Result<EndpointId, Error> {
        check_endpoint(name, count)?;
        let id = self.assign_id();
        self.current_mut().destinations.push(Endpoint {
            name: name.to_string(),
            category,
            base,
            count,
            id_offset,
            id,
        });
        Ok(id)
    }

    /// Add route in the current mode. The route to the same destination channel is replaced,
    /// then the previous source is returned. The mode unsupported by the model has no route.
    pub fn add_route(
        &mut self,
        src_id: SrcBlkId,
        src_ch: u8,
        dst_id: DstBlkId,
        dst_ch: u8,
    ) -> Result<Option<SrcBlk>, Error> {
        self.check_rate_mode(self.rate_mode)?;
        check_channel(src_ch)?;
        check_channel(dst_ch)?;

        let src = SrcBlk {
            id: src_id,
            ch: src_ch,
        };
        let dst = DstBlk {
            id: dst_id,
            ch: dst_ch,
        };
        let prev = self.current_mut().routes.insert(src, dst);
        if let Some(prev) = prev {
            debug!(parent: &self.span, ?dst, ?prev, ?src, "route replaced");
        }
        Ok(prev)
    }

    fn check_rate_mode(&self, rate_mode: RateMode) -> Result<(), Error> {
        if self.model.is_supported(rate_mode) {
            Ok(())
        } else {
            let msg = format!("{:?} is not supported by {:?}", rate_mode, self.model);
            Err(Error::new(ErrorKind::Unsupported, &msg))
        }
    }

    /// Declare endpoints of the model for the mode. The endpoints declared for the mode before
    /// are replaced.
    pub fn declare_endpoints(&mut self, rate_mode: RateMode) -> Result<RouterSetup, Error> {
        if !self.model.is_supported(rate_mode) {
            warn!(
                parent: &self.span,
                model = ?self.model,
                ?rate_mode,
                "endpoints are not available in the rate mode",
            );
            return Ok(RouterSetup::Unsupported);
        }

        self.set_rate_mode(rate_mode);
        let config = self.current_mut();
        config.sources.clear();
        config.destinations.clear();

        let (srcs, dsts) = self.model.endpoints(rate_mode);
        let count = srcs.len() + dsts.len();
        srcs.iter().try_for_each(|decl| {
            let id_offset = next_id_offset(&self.config(rate_mode).sources, &decl.name)?;
            self.add_source(&decl.name, decl.base, decl.count, decl.category, id_offset)
                .map(|_| ())
        })?;
        dsts.iter().try_for_each(|decl| {
            let id_offset = next_id_offset(&self.config(rate_mode).destinations, &decl.name)?;
            self.add_destination(&decl.name, decl.base, decl.count, decl.category, id_offset)
                .map(|_| ())
        })?;

        Ok(RouterSetup::Applied(count))
    }

    /// Populate default routes of the model for the mode. The routes in the mode are cleared at
    /// first. The mode unsupported by the model results in empty table with diagnostic.
    pub fn setup_default_router_config(
        &mut self,
        rate_mode: RateMode,
    ) -> Result<RouterSetup, Error> {
        self.set_rate_mode(rate_mode);
        self.current_mut().routes.clear();

        if !self.model.is_supported(rate_mode) {
            warn!(
                parent: &self.span,
                model = ?self.model,
                ?rate_mode,
                "default router configuration is not supported in the rate mode",
            );
            return Ok(RouterSetup::Unsupported);
        }

        let routes = self.model.default_routes(rate_mode);
        routes
            .iter()
            .try_for_each(|r| {
                self.add_route(r.src.id, r.src.ch, r.dst.id, r.dst.ch)
                    .map(|_| ())
            })?;

        debug!(
            parent: &self.span,
            ?rate_mode,
            count = routes.len(),
            "default routes populated",
        );

        Ok(RouterSetup::Applied(routes.len()))
    }

    /// Write routes of the mode to router section, then initiate command to load them.
    pub fn write_router_entries<A: RegisterAccess + ?Sized>(
        &self,
        gateway: &mut A,
        rate_mode: RateMode,
    ) -> Result<(), Error> {
        self.check_rate_mode(rate_mode)?;

        let mut entries: Vec<RouterEntry> = self
            .routes(rate_mode)
            .iter()
            .map(|route| RouterEntry {
                dst: route.dst,
                src: route.src,
                ..Default::default()
            })
            .collect();
        place_fixed_entries(&mut entries, self.model.fixed_sources());

        let capacity = self.model.router_entry_capacity();
        if entries.len() > capacity {
            let msg = format!(
                "The number of router entries should be less than {}, but {} given",
                capacity,
                entries.len(),
            );
            Err(Error::new(ErrorKind::Usage, &msg))?
        }

        entry::write_router_entries(gateway, &entries)?;
        initiate(gateway, Opcode::LoadRouter(rate_mode)).map(|_| ())
    }
}
