// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Control surface of the unit.
//!
//! The module includes structure and its implementation to serialize any mutation of control
//! elements and routing model. Each change of element consists of two ordered writes, thus a
//! single lock is held for the whole sequence so that the writes by several threads never
//! interleave.

use {
    super::{command::*, control::*, focusrite::*, label::*, register::*, router::*, *},
    std::sync::{Mutex, MutexGuard},
    tracing::{debug, Span},
};

struct SurfaceState<A> {
    gateway: A,
    tree: Container,
    router: RouterModel,
}

/// The tree of control elements and routing model with the gateway to registers.
pub struct ControlSurface<A> {
    state: Mutex<SurfaceState<A>>,
    model: DeviceModel,
    span: Span,
}

fn missing_element(path: &str) -> Error {
    let msg = format!("Element not found: {}", path);
    Error::new(ErrorKind::Usage, &msg)
}

fn mismatched_element(path: &str, expected: &str) -> Error {
    let msg = format!("Element {} is not {}", path, expected);
    Error::new(ErrorKind::Usage, &msg)
}

impl<A: RegisterAccess> ControlSurface<A> {
    /// Build the tree of control elements and routing model for the model, then populate
    /// endpoints and default routes in the mode.
    pub fn new(
        gateway: A,
        model: DeviceModel,
        rate_mode: RateMode,
        span: Span,
    ) -> Result<Self, Error> {
        let tree = model.build_control_tree()?;
        let mut router = RouterModel::new(model, span.clone());
        router.declare_endpoints(rate_mode)?;
        router.setup_default_router_config(rate_mode)?;

        debug!(parent: &span, model = model.name(), ?rate_mode, "control surface built");

        Ok(Self {
            state: Mutex::new(SurfaceState {
                gateway,
                tree,
                router,
            }),
            model,
            span,
        })
    }

    pub fn model(&self) -> DeviceModel {
        self.model
    }

    fn lock(&self) -> Result<MutexGuard<'_, SurfaceState<A>>, Error> {
        self.state
            .lock()
            .map_err(|_| Error::new(ErrorKind::Usage, "Control surface is poisoned"))
    }

    /// Full paths of elements.
    pub fn paths(&self) -> Result<Vec<String>, Error> {
        self.lock().map(|state| state.tree.paths())
    }

    /// Description of the element.
    pub fn describe(&self, path: &str) -> Result<String, Error> {
        let state = self.lock()?;
        state
            .tree
            .find(path)
            .map(|elem| elem.to_string())
            .ok_or_else(|| missing_element(path))
    }

    /// Change the state of switch.
    pub fn set_switch(&self, path: &str, enable: bool) -> Result<(), Error> {
        let mut guard = self.lock()?;
        let SurfaceState { gateway, tree, .. } = &mut *guard;
        match tree.find_mut(path) {
            Some(ControlElement::Switch(switch)) => {
                switch.set(gateway, enable)?;
                debug!(parent: &self.span, path, enable, "switch changed");
                Ok(())
            }
            Some(_) => Err(mismatched_element(path, "switch")),
            None => Err(missing_element(path)),
        }
    }

    /// Read the state of switch.
    pub fn switch(&self, path: &str) -> Result<bool, Error> {
        let mut guard = self.lock()?;
        let SurfaceState { gateway, tree, .. } = &mut *guard;
        match tree.find(path) {
            Some(ControlElement::Switch(switch)) => switch.get(gateway),
            Some(_) => Err(mismatched_element(path, "switch")),
            None => Err(missing_element(path)),
        }
    }

    /// Change the level of volume.
    pub fn set_volume(&self, path: &str, level: i32) -> Result<(), Error> {
        let mut guard = self.lock()?;
        let SurfaceState { gateway, tree, .. } = &mut *guard;
        match tree.find_mut(path) {
            Some(ControlElement::Volume(vol)) => {
                vol.set(gateway, level)?;
                debug!(parent: &self.span, path, level, "volume changed");
                Ok(())
            }
            Some(_) => Err(mismatched_element(path, "volume")),
            None => Err(missing_element(path)),
        }
    }

    /// Read the level of volume.
    pub fn volume(&self, path: &str) -> Result<i32, Error> {
        let mut guard = self.lock()?;
        let SurfaceState { gateway, tree, .. } = &mut *guard;
        match tree.find(path) {
            Some(ControlElement::Volume(vol)) => vol.get(gateway),
            Some(_) => Err(mismatched_element(path, "volume")),
            None => Err(missing_element(path)),
        }
    }

    /// Select the mode of sampling transfer frequency. Endpoints and default routes are
    /// populated at the first selection of the mode.
    pub fn select_rate_mode(&self, rate_mode: RateMode) -> Result<RouterSetup, Error> {
        let mut state = self.lock()?;
        let router = &mut state.router;
        let config = router.config(rate_mode);
        if !config.sources.is_empty() || !config.destinations.is_empty() {
            router.set_rate_mode(rate_mode);
            return Ok(RouterSetup::Applied(0));
        }

        // The unsupported mode is selected as well, with empty table.
        router.declare_endpoints(rate_mode)?;
        router.setup_default_router_config(rate_mode)
    }

    /// The mode currently selected.
    pub fn rate_mode(&self) -> Result<RateMode, Error> {
        self.lock().map(|state| state.router.rate_mode())
    }

    /// Add route in the mode currently selected. The mode unsupported by the model has no route.
    pub fn add_route(
        &self,
        src_id: SrcBlkId,
        src_ch: u8,
        dst_id: DstBlkId,
        dst_ch: u8,
    ) -> Result<Option<SrcBlk>, Error> {
        self.lock()?
            .router
            .add_route(src_id, src_ch, dst_id, dst_ch)
    }

    /// Routes in the mode.
    pub fn routes(&self, rate_mode: RateMode) -> Result<Vec<Route>, Error> {
        self.lock()
            .map(|state| state.router.routes(rate_mode).iter().collect())
    }

    /// Endpoints and routes in the mode.
    pub fn router_config(&self, rate_mode: RateMode) -> Result<RouterConfig, Error> {
        self.lock()
            .map(|state| state.router.config(rate_mode).clone())
    }

    /// Write routes in the mode currently selected to the unit.
    pub fn write_routes(&self) -> Result<(), Error> {
        let mut guard = self.lock()?;
        let SurfaceState {
            gateway, router, ..
        } = &mut *guard;
        let rate_mode = router.rate_mode();
        router.write_router_entries(gateway, rate_mode)?;
        debug!(
            parent: &self.span,
            ?rate_mode,
            count = router.routes(rate_mode).len(),
            "routes written",
        );
        Ok(())
    }

    /// Store current configuration of the unit to its on-board flash memory.
    pub fn store_configuration(&self) -> Result<(), Error> {
        let mut state = self.lock()?;
        store_configuration(&mut state.gateway)?;
        debug!(parent: &self.span, "configuration stored");
        Ok(())
    }

    /// Read nickname of the unit.
    pub fn nickname(&self) -> Result<String, Error> {
        let mut state = self.lock()?;
        FixedStringField::nickname().read(&mut state.gateway)
    }

    /// Write nickname of the unit. The name longer than the field is truncated.
    pub fn set_nickname(&self, name: &str) -> Result<(), Error> {
        let mut state = self.lock()?;
        FixedStringField::nickname().write(&mut state.gateway, name)
    }

    /// Release the gateway.
    pub fn into_gateway(self) -> Result<A, Error> {
        self.state
            .into_inner()
            .map(|state| state.gateway)
            .map_err(|_| Error::new(ErrorKind::Usage, "Control surface is poisoned"))
    }
}
