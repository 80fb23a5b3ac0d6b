//! BLE stack adapter (Bluedroid GAP + GATT server).
//!
//! Implements [`StackPort`], [`GattServerPort`] and [`GapPort`].  Every
//! stack callback is translated into a [`StackEvent`] and posted to the
//! task queue; the adapter never calls into the domain directly.
//!
//! ```text
//!  Bluedroid task                         worker
//!  ─────────────                          ──────
//!  REG_EVT         ──▶ InitComplete       ──▶ controller.on_init_complete
//!  CREAT_ATTR_TAB  ──▶ ServiceRegistered  ──▶ controller.on_service_registered
//!  CONNECT_EVT     ──▶ ConnectionComplete ──▶ ...
//!  WRITE_EVT       ──▶ DataWritten / UpdatesEnabled / UpdatesDisabled
//!  CONF_EVT        ──▶ ConfirmationReceived
//! ```
//!
//! - **`target_os = "espidf"`**: raw `esp_idf_svc::sys` Bluedroid calls.
//!   The GATT table is built with `esp_ble_gatts_create_attr_tab` so the
//!   stack answers reads, descriptor reads and CCCD writes by itself.
//! - **`not(target_os = "espidf")`**: an in-memory radio for host runs and
//!   tests, with `sim_*` hooks that post the same events a real central
//!   would cause.

use log::info;

use crate::advertising::{AdvHandle, AdvertisingParameters, AdvertisingPayload};
use crate::app::ports::{GapPort, GattServerPort, StackPort};
use crate::config::DEVICE_NAME_MAX;
use crate::error::BleError;
use crate::events::{EventQueue, StackEvent, Task};
use crate::gatt::{AttrHandle, CHARACTERISTIC_COUNT, ServiceDefinition};

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
const GATT_IF_NONE: u32 = 0xFF;

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(GATT_IF_NONE);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
/// Value handle per characteristic, in registration order.
#[cfg(target_os = "espidf")]
static BLE_VALUE_HANDLES: [AtomicU16; CHARACTERISTIC_COUNT] = [const { AtomicU16::new(0) }; CHARACTERISTIC_COUNT];
/// CCCD handle per characteristic (0 = not notifiable).
#[cfg(target_os = "espidf")]
static BLE_CCCD_HANDLES: [AtomicU16; CHARACTERISTIC_COUNT] = [const { AtomicU16::new(0) }; CHARACTERISTIC_COUNT];
/// Bit `i` set = the peer subscribed to characteristic `i`.
#[cfg(target_os = "espidf")]
static BLE_NOTIFY_MASK: AtomicU8 = AtomicU8::new(0);

// Table indices of the requested service, read back by CREAT_ATTR_TAB_EVT.
// GATTS callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.
#[cfg(target_os = "espidf")]
static BLE_TABLE_INDICES: std::sync::Mutex<Option<attr_table::Indices>> = std::sync::Mutex::new(None);

#[cfg(target_os = "espidf")]
fn esp_status(ret: i32) -> Result<(), BleError> {
    use esp_idf_svc::sys::*;
    match ret {
        r if r == ESP_OK as i32 => Ok(()),
        r if r == ESP_ERR_INVALID_ARG as i32 => Err(BleError::InvalidParam),
        r if r == ESP_ERR_INVALID_STATE as i32 => Err(BleError::InvalidState),
        r if r == ESP_ERR_NO_MEM as i32 => Err(BleError::NoResources),
        r if r == ESP_ERR_TIMEOUT as i32 => Err(BleError::Timeout),
        r => Err(BleError::Stack(r)),
    }
}

#[cfg(target_os = "espidf")]
fn post(event: StackEvent) {
    // A full queue counts the drop itself.
    let _ = crate::events::EVENT_QUEUE.post(Task::Stack(event));
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_data_raw_cmpl.status };
            if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::warn!("BLE GAP: advertising payload rejected (status={})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("BLE GAP: advertising started");
            } else {
                log::warn!("BLE GAP: advertising start failed (status={})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            let status = unsafe { (*param).reg.status };
            if status == esp_gatt_status_t_ESP_GATT_OK {
                BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Release);
                log::info!("BLE GATTS: app registered (if={})", gatts_if);
                post(StackEvent::InitComplete(Ok(())));
            } else {
                post(StackEvent::InitComplete(Err(BleError::Stack(status as i32))));
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREAT_ATTR_TAB_EVT => {
            let p = unsafe { &(*param).add_attr_tab };
            let result = if p.status != esp_gatt_status_t_ESP_GATT_OK {
                Err(BleError::Stack(p.status as i32))
            } else if p.handles.is_null() {
                Err(BleError::NoResources)
            } else {
                let raw = unsafe { core::slice::from_raw_parts(p.handles, p.num_handle as usize) };
                on_table_created(raw)
            };
            if let Err(e) = result {
                log::warn!("BLE GATTS: attribute table failed: {}", e);
            }
            post(StackEvent::ServiceRegistered(result));
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_CONN_ID.store(p.conn_id as u32, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Release);
            post(StackEvent::ConnectionComplete);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONNECTED.store(false, AtomicOrdering::Release);
            BLE_NOTIFY_MASK.store(0, AtomicOrdering::Relaxed);
            post(StackEvent::DisconnectionComplete);
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            let data: &[u8] = if p.value.is_null() {
                &[]
            } else {
                unsafe { core::slice::from_raw_parts(p.value, p.len as usize) }
            };
            on_gatts_write(p.handle, data);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONF_EVT => {
            let p = unsafe { &(*param).conf };
            post(StackEvent::ConfirmationReceived(AttrHandle(p.handle)));
        }
        _ => {}
    }
}

/// Map the raw attribute handles onto the characteristics and start the
/// service.
#[cfg(target_os = "espidf")]
fn on_table_created(raw: &[u16]) -> Result<[AttrHandle; CHARACTERISTIC_COUNT], BleError> {
    let indices = BLE_TABLE_INDICES
        .lock()
        .ok()
        .and_then(|guard| *guard)
        .ok_or(BleError::InvalidState)?;
    let lookup = |i: usize| raw.get(i).copied().ok_or(BleError::NoResources);

    let mut handles = [AttrHandle(0); CHARACTERISTIC_COUNT];
    for i in 0..CHARACTERISTIC_COUNT {
        let value = lookup(indices.value_index[i])?;
        handles[i] = AttrHandle(value);
        BLE_VALUE_HANDLES[i].store(value, AtomicOrdering::Relaxed);
        let cccd = match indices.cccd_index[i] {
            Some(idx) => lookup(idx)?,
            None => 0,
        };
        BLE_CCCD_HANDLES[i].store(cccd, AtomicOrdering::Relaxed);
    }

    let service = lookup(0)?;
    esp_status(unsafe { esp_idf_svc::sys::esp_ble_gatts_start_service(service) })?;
    log::info!("BLE GATTS: service started (handle={})", service);
    Ok(handles)
}

/// CCCD writes become subscription events, everything else is data.
#[cfg(target_os = "espidf")]
fn on_gatts_write(handle: u16, data: &[u8]) {
    let cccd = BLE_CCCD_HANDLES
        .iter()
        .position(|h| h.load(AtomicOrdering::Relaxed) == handle && handle != 0);
    let Some(i) = cccd else {
        post(StackEvent::data_written(AttrHandle(handle), data));
        return;
    };
    let value = AttrHandle(BLE_VALUE_HANDLES[i].load(AtomicOrdering::Relaxed));
    let enabled = data.first().is_some_and(|b| b & 0x03 != 0);
    if enabled {
        BLE_NOTIFY_MASK.fetch_or(1 << i, AtomicOrdering::Relaxed);
        post(StackEvent::UpdatesEnabled(value));
    } else {
        BLE_NOTIFY_MASK.fetch_and(!(1 << i), AtomicOrdering::Relaxed);
        post(StackEvent::UpdatesDisabled(value));
    }
}

// ── Attribute table (ESP-IDF) ─────────────────────────────────

#[cfg(target_os = "espidf")]
mod attr_table {
    use esp_idf_svc::sys::*;

    use crate::gatt::{
        Access, CHARACTERISTIC_COUNT, CLIENT_CONFIG_UUID, ServiceDefinition, USER_DESCRIPTION_UUID,
    };

    const PRIMARY_SERVICE_UUID: u16 = 0x2800;
    const CHARACTERISTIC_DECLARATION_UUID: u16 = 0x2803;

    /// Table index of each value and CCCD attribute.
    #[derive(Debug, Clone, Copy)]
    pub struct Indices {
        pub value_index: [usize; CHARACTERISTIC_COUNT],
        pub cccd_index: [Option<usize>; CHARACTERISTIC_COUNT],
    }

    pub struct Layout {
        pub entries: &'static [esp_gatts_attr_db_t],
        pub indices: Indices,
    }

    /// The table is registered once and must outlive the stack, so its
    /// backing memory is leaked.
    fn leak(bytes: &[u8]) -> *mut u8 {
        Box::leak(bytes.to_vec().into_boxed_slice()).as_mut_ptr()
    }

    fn attr(uuid: u16, perm: u32, max_len: usize, value: &[u8]) -> esp_gatts_attr_db_t {
        esp_gatts_attr_db_t {
            attr_control: esp_attr_control_t {
                auto_rsp: ESP_GATT_AUTO_RSP as u8,
            },
            att_desc: esp_attr_desc_t {
                uuid_length: ESP_UUID_LEN_16 as u16,
                uuid_p: leak(&uuid.to_le_bytes()),
                perm: perm as u16,
                max_length: max_len as u16,
                length: value.len() as u16,
                value: leak(value),
            },
        }
    }

    pub fn build(def: &ServiceDefinition) -> Layout {
        let mut entries = Vec::with_capacity(1 + 4 * CHARACTERISTIC_COUNT);
        let mut value_index = [0; CHARACTERISTIC_COUNT];
        let mut cccd_index = [None; CHARACTERISTIC_COUNT];

        entries.push(attr(PRIMARY_SERVICE_UUID, ESP_GATT_PERM_READ, 2, &def.uuid.to_le_bytes()));
        for (i, c) in def.characteristics.iter().enumerate() {
            let (props, perm) = match c.access {
                Access::ReadNotify => (
                    ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_NOTIFY,
                    ESP_GATT_PERM_READ,
                ),
                Access::WriteOnly => (ESP_GATT_CHAR_PROP_BIT_WRITE, ESP_GATT_PERM_WRITE),
            };
            entries.push(attr(CHARACTERISTIC_DECLARATION_UUID, ESP_GATT_PERM_READ, 1, &[props as u8]));
            value_index[i] = entries.len();
            entries.push(attr(c.uuid, perm, 1, &[c.initial]));
            let desc = c.description.as_bytes();
            entries.push(attr(USER_DESCRIPTION_UUID, ESP_GATT_PERM_READ, desc.len(), desc));
            if c.access == Access::ReadNotify {
                cccd_index[i] = Some(entries.len());
                entries.push(attr(
                    CLIENT_CONFIG_UUID,
                    ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE,
                    2,
                    &[0, 0],
                ));
            }
        }

        Layout {
            entries: Vec::leak(entries),
            indices: Indices {
                value_index,
                cccd_index,
            },
        }
    }
}

// ── Simulated radio (host) ────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimRadio {
    initialized: bool,
    handles: Option<[AttrHandle; CHARACTERISTIC_COUNT]>,
    params: Option<AdvertisingParameters>,
    payload: Option<AdvertisingPayload>,
    advertising: bool,
    connected: bool,
    values: heapless::Vec<(AttrHandle, u8), CHARACTERISTIC_COUNT>,
}

// ── Adapter ───────────────────────────────────────────────────

pub struct BleAdapter<'q> {
    queue: &'q EventQueue,
    device_name: heapless::String<DEVICE_NAME_MAX>,
    #[cfg(target_os = "espidf")]
    adv_params: Option<AdvertisingParameters>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

impl<'q> BleAdapter<'q> {
    /// `queue` receives every stack event.  On ESP-IDF it must be
    /// [`EVENT_QUEUE`](crate::events::EVENT_QUEUE), which the Bluedroid
    /// callbacks post to.
    pub fn new(queue: &'q EventQueue, device_name: heapless::String<DEVICE_NAME_MAX>) -> Self {
        Self {
            queue,
            device_name,
            #[cfg(target_os = "espidf")]
            adv_params: None,
            #[cfg(not(target_os = "espidf"))]
            sim: SimRadio::default(),
        }
    }

    fn post(&self, event: StackEvent) {
        // A full queue counts the drop itself.
        let _ = self.queue.post(Task::Stack(event));
    }
}

// ── ESP-IDF implementation ────────────────────────────────────

#[cfg(target_os = "espidf")]
impl BleAdapter<'_> {
    fn bring_up(&mut self) -> Result<(), BleError> {
        use esp_idf_svc::sys::*;
        // SAFETY: called once from the worker before any callback can fire.
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            // Fails harmlessly if already released.
            let _ = esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            esp_status(esp_bt_controller_init(&mut bt_cfg))?;
            esp_status(esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE))?;
            esp_status(esp_bluedroid_init())?;
            esp_status(esp_bluedroid_enable())?;

            esp_status(esp_ble_gap_register_callback(Some(ble_gap_event_handler)))?;
            esp_status(esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)))?;

            let mut name = heapless::Vec::<u8, { DEVICE_NAME_MAX + 1 }>::new();
            let _ = name.extend_from_slice(self.device_name.as_bytes());
            let _ = name.push(0);
            esp_status(esp_ble_gap_set_device_name(name.as_ptr() as *const _))?;

            // Completion arrives as REG_EVT.
            esp_status(esp_ble_gatts_app_register(0))?;
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl StackPort for BleAdapter<'_> {
    fn initialize(&mut self) {
        info!("BLE: bringing up Bluedroid as '{}'", self.device_name);
        if let Err(e) = self.bring_up() {
            self.post(StackEvent::InitComplete(Err(e)));
        }
    }

    fn address(&self) -> Option<[u8; 6]> {
        use esp_idf_svc::sys::*;
        let mut mac = [0u8; 6];
        let ret = unsafe { esp_read_mac(mac.as_mut_ptr(), esp_mac_type_t_ESP_MAC_BT) };
        esp_status(ret).ok()?;
        // Over-the-air order is least significant byte first.
        mac.reverse();
        Some(mac)
    }
}

#[cfg(target_os = "espidf")]
impl GattServerPort for BleAdapter<'_> {
    /// Completion arrives as CREAT_ATTR_TAB_EVT.
    fn register_service(&mut self, def: &ServiceDefinition) -> Result<(), BleError> {
        use esp_idf_svc::sys::*;

        let gatts_if = BLE_GATTS_IF.load(AtomicOrdering::Acquire);
        if gatts_if == GATT_IF_NONE {
            return Err(BleError::NotInitialized);
        }
        let mut pending = BLE_TABLE_INDICES.lock().map_err(|_| BleError::InvalidState)?;
        if pending.is_some() {
            return Err(BleError::InvalidState);
        }

        let layout = attr_table::build(def);
        *pending = Some(layout.indices);
        drop(pending);

        let ret = unsafe {
            esp_ble_gatts_create_attr_tab(
                layout.entries.as_ptr(),
                gatts_if as _,
                layout.entries.len() as _,
                0,
            )
        };
        esp_status(ret).inspect_err(|_| {
            if let Ok(mut pending) = BLE_TABLE_INDICES.lock() {
                *pending = None;
            }
        })
    }

    fn write(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), BleError> {
        use esp_idf_svc::sys::*;

        esp_status(unsafe { esp_ble_gatts_set_attr_value(handle.0, value.len() as u16, value.as_ptr()) })?;

        let index = BLE_VALUE_HANDLES
            .iter()
            .position(|h| h.load(AtomicOrdering::Relaxed) == handle.0);
        let subscribed = index.is_some_and(|i| BLE_NOTIFY_MASK.load(AtomicOrdering::Relaxed) & (1 << i) != 0);
        if BLE_CONNECTED.load(AtomicOrdering::Acquire) && subscribed {
            let gatts_if = BLE_GATTS_IF.load(AtomicOrdering::Relaxed);
            let conn_id = BLE_CONN_ID.load(AtomicOrdering::Relaxed);
            esp_status(unsafe {
                esp_ble_gatts_send_indicate(
                    gatts_if as _,
                    conn_id as _,
                    handle.0,
                    value.len() as u16,
                    value.as_ptr() as *mut u8,
                    false,
                )
            })?;
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl GapPort for BleAdapter<'_> {
    fn set_advertising_parameters(
        &mut self,
        handle: AdvHandle,
        params: &AdvertisingParameters,
    ) -> Result<(), BleError> {
        if handle != AdvHandle::LEGACY {
            return Err(BleError::InvalidParam);
        }
        // Bluedroid takes legacy parameters with the start call.
        self.adv_params = Some(*params);
        Ok(())
    }

    fn set_advertising_payload(&mut self, handle: AdvHandle, payload: &AdvertisingPayload) -> Result<(), BleError> {
        use esp_idf_svc::sys::*;
        if handle != AdvHandle::LEGACY {
            return Err(BleError::InvalidParam);
        }
        let bytes = payload.as_bytes();
        esp_status(unsafe { esp_ble_gap_config_adv_data_raw(bytes.as_ptr() as *mut u8, bytes.len() as u32) })
    }

    fn start_advertising(&mut self, handle: AdvHandle) -> Result<(), BleError> {
        use crate::advertising::AdvertisingType;
        use esp_idf_svc::sys::*;

        if handle != AdvHandle::LEGACY {
            return Err(BleError::InvalidParam);
        }
        let params = self.adv_params.ok_or(BleError::InvalidState)?;
        let units = params.interval_units();
        let mut raw = esp_ble_adv_params_t {
            adv_int_min: units,
            adv_int_max: units,
            adv_type: match params.kind {
                AdvertisingType::ConnectableUndirected => esp_ble_adv_type_t_ADV_TYPE_IND,
                AdvertisingType::NonConnectable => esp_ble_adv_type_t_ADV_TYPE_NONCONN_IND,
            },
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            ..unsafe { core::mem::zeroed() }
        };
        esp_status(unsafe { esp_ble_gap_start_advertising(&mut raw) })
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl BleAdapter<'_> {
    pub fn is_advertising(&self) -> bool {
        self.sim.advertising
    }

    pub fn is_connected(&self) -> bool {
        self.sim.connected
    }

    /// Last value written to `handle` through the GATT server.
    pub fn attr_value(&self, handle: AttrHandle) -> Option<u8> {
        self.sim
            .values
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, v)| *v)
    }

    /// A central connects.  Advertising stops, as on a real controller.
    pub fn sim_connect(&mut self) {
        self.sim.advertising = false;
        self.sim.connected = true;
        self.post(StackEvent::ConnectionComplete);
    }

    /// The central drops the link.
    pub fn sim_disconnect(&mut self) {
        self.sim.connected = false;
        self.post(StackEvent::DisconnectionComplete);
    }

    /// The central writes `bytes` to `handle`.
    pub fn sim_write(&mut self, handle: AttrHandle, bytes: &[u8]) {
        self.post(StackEvent::data_written(handle, bytes));
    }

    /// The central toggles notifications on `handle`.
    pub fn sim_subscribe(&mut self, handle: AttrHandle, enabled: bool) {
        if enabled {
            self.post(StackEvent::UpdatesEnabled(handle));
        } else {
            self.post(StackEvent::UpdatesDisabled(handle));
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl StackPort for BleAdapter<'_> {
    fn initialize(&mut self) {
        info!("BLE(sim): stack up as '{}'", self.device_name);
        self.sim.initialized = true;
        self.post(StackEvent::InitComplete(Ok(())));
    }

    fn address(&self) -> Option<[u8; 6]> {
        self.sim.initialized.then_some([0x01, 0x00, 0x00, 0x5E, 0xED, 0xC0])
    }
}

#[cfg(not(target_os = "espidf"))]
impl GattServerPort for BleAdapter<'_> {
    /// Completes through the queue, like the device table event.
    fn register_service(&mut self, def: &ServiceDefinition) -> Result<(), BleError> {
        if !self.sim.initialized {
            return Err(BleError::NotInitialized);
        }
        if self.sim.handles.is_some() {
            return Err(BleError::InvalidState);
        }
        // Mirror the attribute table layout: service declaration first,
        // then declaration, value, description and optional CCCD per
        // characteristic.
        let mut next = 2u16;
        let mut handles = [AttrHandle(0); CHARACTERISTIC_COUNT];
        for (slot, c) in handles.iter_mut().zip(def.characteristics.iter()) {
            *slot = AttrHandle(next + 1);
            let _ = self.sim.values.push((*slot, c.initial));
            next += if c.access == crate::gatt::Access::ReadNotify { 4 } else { 3 };
        }
        self.sim.handles = Some(handles);
        info!("BLE(sim): service 0x{:04X} registered", def.uuid);
        self.post(StackEvent::ServiceRegistered(Ok(handles)));
        Ok(())
    }

    fn write(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), BleError> {
        let [byte] = value else {
            return Err(BleError::InvalidParam);
        };
        let slot = self
            .sim
            .values
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .ok_or(BleError::InvalidParam)?;
        slot.1 = *byte;
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl GapPort for BleAdapter<'_> {
    fn set_advertising_parameters(
        &mut self,
        handle: AdvHandle,
        params: &AdvertisingParameters,
    ) -> Result<(), BleError> {
        if handle != AdvHandle::LEGACY {
            return Err(BleError::InvalidParam);
        }
        self.sim.params = Some(*params);
        Ok(())
    }

    fn set_advertising_payload(&mut self, handle: AdvHandle, payload: &AdvertisingPayload) -> Result<(), BleError> {
        if handle != AdvHandle::LEGACY {
            return Err(BleError::InvalidParam);
        }
        self.sim.payload = Some(payload.clone());
        Ok(())
    }

    fn start_advertising(&mut self, handle: AdvHandle) -> Result<(), BleError> {
        if handle != AdvHandle::LEGACY {
            return Err(BleError::InvalidParam);
        }
        if self.sim.params.is_none() || self.sim.payload.is_none() {
            return Err(BleError::InvalidState);
        }
        if self.sim.connected {
            return Err(BleError::Busy);
        }
        self.sim.advertising = true;
        Ok(())
    }
}
