//! BLE transport adapter.
//!
//! Exposes the command protocol over a Nordic UART Service (NUS) GATT
//! server so phone bench apps can drive the rig wirelessly. Inbound
//! writes land as text lines, outbound telemetry goes out as notifications.
//!
//! ## Hand-off contract
//!
//! The Bluedroid GATTS write callback runs on the Bluetooth host task. It
//! never touches throttle state: it only pushes the received line onto
//! [`crate::channels::LINE_CHANNEL`] and returns. The control loop is the
//! sole consumer and the only code that mutates arm/target/output state.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via raw sys calls.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout (Nordic UART Service)
//!
//! | Characteristic | UUID                                    | Perms  |
//! |----------------|-----------------------------------------|--------|
//! | RX (commands)  | `6e400002-b5a3-f393-e0a9-e50e24dcca9e`  | Write  |
//! | TX (telemetry) | `6e400003-b5a3-f393-e0a9-e50e24dcca9e`  | Notify |

use core::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use log::info;

use crate::app::ports::LineSink;
use crate::channels::{self, Source};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

// Nordic UART Service. Deployed client apps discover these exact 128-bit
// values; they must never change.
pub const SERVICE_UUID: u128 = 0x6e400001_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_RX: u128 = 0x6e400002_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_TX: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

pub const DEVICE_NAME: &str = "thrustbench";

/// Notification payload ceiling for the default ATT MTU of 23.
const NOTIFY_CHUNK: usize = 20;

// ───────────────────────────────────────────────────────────────
// Shared connection flag
// ───────────────────────────────────────────────────────────────

// Set by the GATTS connect/disconnect events, polled by the control loop.
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);

pub fn is_connected() -> bool {
    BLE_CONNECTED.load(AtomicOrdering::Relaxed)
}

/// Host-side test hook for the connection flag.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_connected(connected: bool) {
    BLE_CONNECTED.store(connected, AtomicOrdering::Relaxed);
}

/// Treat one GATTS write as one command line. Trailing CR/LF from clients
/// that terminate lines is stripped; state changes happen later, in the
/// control loop.
fn enqueue_write(data: &[u8]) {
    let text = match core::str::from_utf8(data) {
        Ok(t) => t,
        Err(_) => {
            log::warn!("BLE: dropping non-UTF-8 write ({} bytes)", data.len());
            return;
        }
    };
    for line in text.split(['\r', '\n']) {
        if !line.is_empty() {
            channels::try_push_line(Source::Ble, line);
        }
    }
}

/// Host-side test hook: feed bytes as if a central had written them.
#[cfg(not(target_os = "espidf"))]
pub fn sim_inject_write(data: &[u8]) {
    enqueue_write(data);
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF BLE static state (callback-safe atomics)
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicU32;

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_RX_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_TX_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    unsafe {
        t.uuid.uuid128 = uuid.to_le_bytes();
    }
    t
}

#[cfg(target_os = "espidf")]
unsafe fn add_gatt_char(svc_handle: u16, uuid: u128, perm: u32, prop: u32) {
    use esp_idf_svc::sys::*;
    let mut char_uuid = uuid128_to_esp(uuid);
    esp_ble_gatts_add_char(
        svc_handle,
        &mut char_uuid,
        perm as esp_gatt_perm_t,
        prop as esp_gatt_char_prop_t,
        core::ptr::null_mut(),
        core::ptr::null_mut(),
    );
}

#[cfg(target_os = "espidf")]
unsafe fn start_advertising() {
    use esp_idf_svc::sys::*;
    let mut adv_params = esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..core::mem::zeroed()
    };
    esp_ble_gap_start_advertising(&mut adv_params);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
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

    BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let svc_uuid = uuid128_to_esp(SERVICE_UUID);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: svc_uuid,
                    inst_id: 0,
                },
                is_primary: true,
            };
            esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let p = &(*param).create;
            let svc_handle = p.service_handle;
            BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            esp_ble_gatts_start_service(svc_handle);
            BLE_CHAR_STEP.store(1, AtomicOrdering::Relaxed);
            add_gatt_char(
                svc_handle,
                CHAR_RX,
                ESP_GATT_PERM_WRITE,
                ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let p = &(*param).add_char;
            let handle = p.attr_handle;
            let step = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed);
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            match step {
                1 => {
                    BLE_RX_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: RX char (handle={})", handle);
                    BLE_CHAR_STEP.store(2, AtomicOrdering::Relaxed);
                    add_gatt_char(svc_handle, CHAR_TX, 0, ESP_GATT_CHAR_PROP_BIT_NOTIFY);
                }
                2 => {
                    BLE_TX_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
                    BLE_CHAR_STEP.store(3, AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: TX char (handle={}) — all registered", handle);
                }
                _ => {}
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_CONN_ID.store(p.conn_id as u32, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client connected (conn_id={})", p.conn_id);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONN_ID.store(0, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(false, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client disconnected");
            // Restart advertising so the bench app can reconnect.
            start_advertising();
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if p.handle as u32 == BLE_RX_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                enqueue_write(data);
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Stack bring-up
// ───────────────────────────────────────────────────────────────

/// Bring up the Bluedroid stack, register the NUS service, and start
/// advertising. Called once from `main()` before the control loop.
#[cfg(target_os = "espidf")]
pub fn start() -> crate::Result<()> {
    use crate::error::{CommsError, Error};
    use esp_idf_svc::sys::*;

    unsafe {
        // BLE-only mode; classic BT memory is never needed.
        esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

        let mut bt_cfg = esp_bt_controller_config_t::default();
        if esp_bt_controller_init(&mut bt_cfg) != ESP_OK as i32 {
            return Err(Error::Comms(CommsError::BleInitFailed));
        }
        if esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE) != ESP_OK as i32 {
            return Err(Error::Comms(CommsError::BleInitFailed));
        }
        if esp_bluedroid_init() != ESP_OK as i32 {
            return Err(Error::Comms(CommsError::BleInitFailed));
        }
        if esp_bluedroid_enable() != ESP_OK as i32 {
            return Err(Error::Comms(CommsError::BleInitFailed));
        }

        esp_ble_gap_register_callback(Some(ble_gap_event_handler));
        esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
        esp_ble_gatts_app_register(0);

        esp_ble_gap_set_device_name(c"thrustbench".as_ptr());
        start_advertising();
    }

    info!("BLE(espidf): NUS server up, advertising as '{}'", DEVICE_NAME);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start() -> crate::Result<()> {
    info!(
        "BLE(sim): advertising '{}' (service {:032x})",
        DEVICE_NAME, SERVICE_UUID
    );
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Outbound sink
// ───────────────────────────────────────────────────────────────

/// [`LineSink`] that notifies lines on the NUS TX characteristic.
///
/// Fire-and-forget: with no central connected, lines are dropped. Payloads
/// are split at the default-MTU notification limit so long CSV rows still
/// arrive whole on the far side.
pub struct BleSink;

impl BleSink {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    fn notify_chunk(&self, chunk: &[u8]) {
        use esp_idf_svc::sys::*;
        let handle = BLE_TX_CHAR_HANDLE.load(AtomicOrdering::Relaxed);
        let conn = BLE_CONN_ID.load(AtomicOrdering::Relaxed);
        let gatts_if = BLE_GATTS_IF.load(AtomicOrdering::Relaxed);
        if handle == 0 {
            return;
        }
        unsafe {
            esp_ble_gatts_send_indicate(
                gatts_if as u8,
                conn as u16,
                handle as u16,
                chunk.len() as u16,
                chunk.as_ptr() as *mut u8,
                false,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn notify_chunk(&self, chunk: &[u8]) {
        log::debug!("BLE(sim): notify {} bytes", chunk.len());
    }
}

impl Default for BleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSink for BleSink {
    fn send_line(&mut self, line: &str) {
        if !is_connected() {
            return;
        }
        let mut payload = heapless::Vec::<u8, 192>::new();
        if payload.extend_from_slice(line.as_bytes()).is_err() {
            // Oversized line: send what fits, the terminator still follows.
            payload.clear();
            let _ = payload.extend_from_slice(&line.as_bytes()[..payload.capacity() - 1]);
        }
        let _ = payload.push(b'\n');
        for chunk in payload.chunks(NOTIFY_CHUNK) {
            self.notify_chunk(chunk);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
