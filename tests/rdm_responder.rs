mod common;

use common::*;
use dmx_rdm_uart::command_class::RequestCommandClass;
use dmx_rdm_uart::consts::{DMX_RECEIVE_UART_CONFIG, DMX_UART_CONFIG, RDM_BREAK_UART_CONFIG};
use dmx_rdm_uart::dmx_driver::DmxDriverConfig;
use dmx_rdm_uart::dmx_uart_driver::BusDirection;
use dmx_rdm_uart::pids;
use dmx_rdm_uart::rdm_responder::RdmConfig;
use dmx_rdm_uart::rdm_types::CommsStatus;
use dmx_rdm_uart::types::NackReason;

fn get(driver: &mut TestDriver, pid: u16) -> Response {
    let request = rdm_request(own_uid(), RequestCommandClass::GetCommand, pid, 0, &[]);
    Response::new(exchange(driver, &request).expect("no response"))
}

fn set(driver: &mut TestDriver, pid: u16, data: &[u8]) -> Response {
    let request = rdm_request(own_uid(), RequestCommandClass::SetCommand, pid, 0, data);
    Response::new(exchange(driver, &request).expect("no response"))
}

#[test]
fn test_response_is_addressed_to_the_controller() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let response = get(&mut driver, pids::DEVICE_INFO);
    assert_eq!(response.destination(), CONTROLLER_UID);
    assert_eq!(response.source(), own_uid());
    assert_eq!(response.transaction_number(), 0x2A);
    assert_eq!(response.response_type(), 0x00);
    assert_eq!(response.command_class(), 0x21);
    assert_eq!(response.parameter_id(), pids::DEVICE_INFO);
    assert_eq!(response.data().len(), 0x13);
    assert_eq!(response.data()[..2], [0x01, 0x00]);
}

#[test]
fn test_response_is_sent_after_an_rdm_break() {
    let mut driver = input_driver(DmxDriverConfig::default());

    get(&mut driver, pids::IDENTIFY_DEVICE);

    let events = &driver.uart_mut().events;
    let transmit = events
        .iter()
        .position(|event| *event == UartEvent::Direction(BusDirection::Transmit))
        .unwrap();
    assert_eq!(
        events[transmit + 1..transmit + 7],
        [
            UartEvent::Configure(RDM_BREAK_UART_CONFIG),
            UartEvent::Write(0),
            UartEvent::Flush,
            UartEvent::Configure(DMX_UART_CONFIG),
            UartEvent::Write(0xCC),
            UartEvent::Flush,
        ]
    );
    assert_eq!(
        events[events.len() - 2..],
        [
            UartEvent::Configure(DMX_RECEIVE_UART_CONFIG),
            UartEvent::Direction(BusDirection::Receive),
        ]
    );
}

#[test]
fn test_not_addressed_requests_are_ignored() {
    let mut driver = input_driver(DmxDriverConfig::default());

    for destination in [
        [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC],
        [0x7F, 0xF0, 0x20, 0x12, 0x00, 0x01],
        [0x7F, 0xF1, 0xFF, 0xFF, 0xFF, 0xFF],
    ] {
        let request = rdm_request(
            destination,
            RequestCommandClass::SetCommand,
            pids::IDENTIFY_DEVICE,
            0,
            &[1],
        );
        assert_eq!(exchange(&mut driver, &request), None);
    }

    assert!(!driver.is_identify());
    assert!(!driver.rdm_changed());
}

#[test]
fn test_broadcasts_are_answered() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let request = rdm_request(
        [0xFF; 6],
        RequestCommandClass::SetCommand,
        pids::IDENTIFY_DEVICE,
        0,
        &[1],
    );
    let response = Response::new(exchange(&mut driver, &request).unwrap());
    assert_eq!(response.response_type(), 0x00);
    assert!(driver.is_identify());

    let request = rdm_request(
        [0x7F, 0xF0, 0xFF, 0xFF, 0xFF, 0xFF],
        RequestCommandClass::SetCommand,
        pids::IDENTIFY_DEVICE,
        0,
        &[0],
    );
    assert!(exchange(&mut driver, &request).is_some());
    assert!(!driver.is_identify());
}

#[test]
fn test_start_address() {
    let mut driver = input_driver(DmxDriverConfig::default());

    for invalid_address in [0u16, 513] {
        let response = set(&mut driver, pids::DMX_START_ADDRESS, &invalid_address.to_be_bytes());
        assert_eq!(response.nack_reason(), NackReason::DataOutOfRange as u16);
        assert_eq!(response.command_class(), 0x31);
    }
    assert_eq!(driver.start_address(), Some(1));
    assert!(!driver.rdm_changed());

    for valid_address in [1u16, 512] {
        let response = set(&mut driver, pids::DMX_START_ADDRESS, &valid_address.to_be_bytes());
        assert_eq!(response.response_type(), 0x00);
        assert!(response.data().is_empty());
        assert_eq!(driver.start_address(), Some(valid_address));

        let response = get(&mut driver, pids::DMX_START_ADDRESS);
        assert_eq!(response.data(), valid_address.to_be_bytes());
    }

    assert!(driver.rdm_changed());
    assert!(!driver.rdm_changed());
}

#[test]
fn test_start_address_without_config() {
    let mut driver = input_driver(DmxDriverConfig {
        rdm_config: None,
        ..Default::default()
    });

    let response = set(&mut driver, pids::DMX_START_ADDRESS, &[0x00, 0x10]);
    assert_eq!(response.nack_reason(), NackReason::HardwareFault as u16);

    let response = get(&mut driver, pids::DMX_START_ADDRESS);
    assert_eq!(response.data(), [0, 0]);
    assert_eq!(driver.start_address(), None);
}

#[test]
fn test_device_label() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let response = set(&mut driver, pids::DEVICE_LABEL, &[b'a'; 33]);
    assert_eq!(response.nack_reason(), NackReason::FormatError as u16);
    assert!(driver.get_label().is_empty());

    let response = set(&mut driver, pids::DEVICE_LABEL, b"truss 2");
    assert_eq!(response.response_type(), 0x00);
    assert_eq!(driver.get_label(), b"truss 2");
    assert!(driver.rdm_changed());

    let response = get(&mut driver, pids::DEVICE_LABEL);
    assert_eq!(response.data(), b"truss 2");
}

#[test]
fn test_identify() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let response = set(&mut driver, pids::IDENTIFY_DEVICE, &[2]);
    assert_eq!(response.nack_reason(), NackReason::DataOutOfRange as u16);

    let response = set(&mut driver, pids::IDENTIFY_DEVICE, &[1]);
    assert_eq!(response.response_type(), 0x00);
    assert!(driver.is_identify());

    let response = get(&mut driver, pids::IDENTIFY_DEVICE);
    assert_eq!(response.data(), [1]);
}

#[test]
fn test_labels_from_config() {
    let mut driver = input_driver(DmxDriverConfig {
        rdm_config: Some(RdmConfig {
            manufacturer_label: "Example Inc.",
            device_model_description: "RGB spot",
            software_version_label: "v1.2.3",
            ..Default::default()
        }),
        ..Default::default()
    });

    assert_eq!(get(&mut driver, pids::MANUFACTURER_LABEL).data(), b"Example Inc.");
    assert_eq!(get(&mut driver, pids::DEVICE_MODEL_DESCRIPTION).data(), b"RGB spot");
    assert_eq!(get(&mut driver, pids::SOFTWARE_VERSION_LABEL).data(), b"v1.2.3");
}

#[test]
fn test_unknown_pid_and_sub_device() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let response = get(&mut driver, 0x0500);
    assert_eq!(response.nack_reason(), NackReason::UnknownPid as u16);
    assert_eq!(response.parameter_id(), 0x0500);

    let request = rdm_request(
        own_uid(),
        RequestCommandClass::GetCommand,
        pids::DEVICE_INFO,
        3,
        &[],
    );
    let response = Response::new(exchange(&mut driver, &request).unwrap());
    assert_eq!(response.nack_reason(), NackReason::SubDeviceOutOfRange as u16);

    let request = rdm_request(
        own_uid(),
        RequestCommandClass::GetCommand,
        pids::DEVICE_INFO,
        0,
        &[0],
    );
    let response = Response::new(exchange(&mut driver, &request).unwrap());
    assert_eq!(response.nack_reason(), NackReason::FormatError as u16);

    let response = set(&mut driver, pids::SUPPORTED_PARAMETERS, &[]);
    assert_eq!(response.nack_reason(), NackReason::UnsupportedCommandClass as u16);
}

#[test]
fn test_supported_parameters() {
    static MANUFACTURER_PIDS: [u16; 1] = [0x8100];
    let mut driver = input_driver(DmxDriverConfig {
        rdm_config: Some(RdmConfig {
            additional_supported_pids: &MANUFACTURER_PIDS,
            ..Default::default()
        }),
        ..Default::default()
    });

    let response = get(&mut driver, pids::SUPPORTED_PARAMETERS);
    assert_eq!(
        response.data(),
        [0x00, 0x81, 0x00, 0x80, 0x00, 0x82, 0x00, 0x15, 0x81, 0x00]
    );
}

fn unique_branch(lower: [u8; 6], upper: [u8; 6]) -> Vec<u8> {
    let mut data = lower.to_vec();
    data.extend_from_slice(&upper);
    rdm_request(
        [0xFF; 6],
        RequestCommandClass::DiscoveryCommand,
        pids::DISC_UNIQUE_BRANCH,
        0,
        &data,
    )
}

#[test]
fn test_discovery() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let request = unique_branch([0; 6], [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]);
    let response = exchange(&mut driver, &request).unwrap();
    assert_eq!(response.len(), 24);
    assert_eq!(response[..7], [0xFE; 7]);
    assert_eq!(response[7], 0xAA);
    assert_eq!(
        response[8..],
        [
            0xFF, 0x7F, 0xFA, 0xF5, 0xAA, 0x75, 0xBA, 0x57, 0xAA, 0x55, 0xAA, 0x55, 0xAF, 0x57,
            0xBB, 0xDF
        ]
    );
    assert!(driver
        .uart_mut()
        .events
        .contains(&UartEvent::Configure(RDM_BREAK_UART_CONFIG)));

    // the range is inclusive
    assert!(exchange(&mut driver, &unique_branch(own_uid(), own_uid())).is_some());
    assert_eq!(
        exchange(&mut driver, &unique_branch([0x7F, 0xF0, 0x20, 0x12, 0x00, 0x01], [0xFF; 6])),
        None
    );

    let mute = rdm_request(
        own_uid(),
        RequestCommandClass::DiscoveryCommand,
        pids::DISC_MUTE,
        0,
        &[],
    );
    let response = Response::new(exchange(&mut driver, &mute).unwrap());
    assert_eq!(response.command_class(), 0x11);
    assert_eq!(response.data(), [0x00, 0x00]);
    assert!(driver.is_muted());

    assert_eq!(
        exchange(&mut driver, &unique_branch([0; 6], [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE])),
        None
    );

    let un_mute = rdm_request(
        own_uid(),
        RequestCommandClass::DiscoveryCommand,
        pids::DISC_UN_MUTE,
        0,
        &[],
    );
    assert!(exchange(&mut driver, &un_mute).is_some());
    assert!(!driver.is_muted());
}

#[test]
fn test_response_delay() {
    let clock = MockClock {
        step: 50,
        ..Default::default()
    };
    let delays = clock.delays.clone();

    let mut driver = input_driver_with_clock(clock);

    get(&mut driver, pids::IDENTIFY_DEVICE);
    assert_eq!(delays.get(), 126);

    // discovery responses are sent right away
    exchange(&mut driver, &unique_branch([0; 6], [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE])).unwrap();
    assert_eq!(delays.get(), 126);
}

#[test]
fn test_no_delay_after_slow_processing() {
    let clock = MockClock {
        step: 200,
        ..Default::default()
    };
    let delays = clock.delays.clone();

    let mut driver = input_driver_with_clock(clock);

    get(&mut driver, pids::IDENTIFY_DEVICE);
    assert_eq!(delays.get(), 0);
}

#[test]
fn test_corrupted_requests_are_counted() {
    let mut driver = input_driver(DmxDriverConfig::default());

    let mut request = rdm_request(
        own_uid(),
        RequestCommandClass::GetCommand,
        pids::IDENTIFY_DEVICE,
        0,
        &[],
    );
    let last = request.len() - 1;
    request[last] ^= 0x01;
    assert_eq!(exchange(&mut driver, &request), None);

    let request = rdm_request(
        own_uid(),
        RequestCommandClass::GetCommand,
        pids::IDENTIFY_DEVICE,
        0,
        &[],
    );
    assert_eq!(exchange(&mut driver, &request[..20]), None);

    assert_eq!(
        driver.comms_status(),
        CommsStatus {
            short_message: 1,
            length_mismatch: 0,
            checksum_fail: 1,
        }
    );

    let response = get(&mut driver, pids::COMMS_STATUS);
    assert_eq!(response.data(), [0, 1, 0, 0, 0, 1]);

    let response = set(&mut driver, pids::COMMS_STATUS, &[]);
    assert_eq!(response.response_type(), 0x00);
    assert_eq!(driver.comms_status(), CommsStatus::default());
}

#[test]
fn test_receive_mode_is_restored_after_a_failed_response() {
    let mut driver = input_driver(DmxDriverConfig::default());
    driver.uart_mut().fail_writes = true;

    let request = rdm_request(
        own_uid(),
        RequestCommandClass::GetCommand,
        pids::IDENTIFY_DEVICE,
        0,
        &[],
    );
    driver.on_break().unwrap();
    driver.uart_mut().input.extend(request);
    driver.on_receive().unwrap();
    assert!(driver.on_break().is_err());

    let events = &driver.uart_mut().events;
    assert_eq!(
        events[events.len() - 2..],
        [
            UartEvent::Configure(DMX_RECEIVE_UART_CONFIG),
            UartEvent::Direction(BusDirection::Receive),
        ]
    );

    driver.uart_mut().fail_writes = false;
    let mut frame = vec![0u8; 513];
    frame[1] = 99;
    receive_frame(&mut driver, &frame);
    assert!(driver.new_frame());
    assert_eq!(driver.get_dmx_channel(1), 99);
}

#[test]
fn test_response_is_sent_outside_the_critical_section() {
    let mut driver = input_driver(DmxDriverConfig::default());
    driver.uart_mut().watch_critical_section = true;

    let response = get(&mut driver, pids::IDENTIFY_DEVICE);
    assert_eq!(response.data(), [0]);
    assert_eq!(driver.uart_mut().written_in_critical_section, Some(false));
}
