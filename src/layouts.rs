// An rdm message as stored in the frame buffer. The start code is consumed by the
// receive state machine and never stored, so every offset is one below the wire offset.
binary_layout::binary_layout!(rdm_message_layout, BigEndian, {
    sub_start_code: u8,
    message_length: u8,
    destination_uid: [u8; 6],
    source_uid: [u8; 6],
    transaction_number: u8,
    port_id_response_type: u8,
    message_count: u8,
    sub_device: u16,
    command_class: u8,
    parameter_id: u16,
    parameter_data_length: u8,
    parameter_data_and_checksum: [u8],
});

binary_layout::binary_layout!(rdm_device_info_layout, BigEndian, {
    protocol_version: u16,
    device_model_id: u16,
    product_category: u16,
    software_version_id: u32,
    dmx_footprint: u16,
    current_personality: u8,
    personality_count: u8,
    dmx_start_address: u16,
    sub_device_count: u16,
    sensor_count: u8,
});

binary_layout::binary_layout!(rdm_comms_status_layout, BigEndian, {
    short_message: u16,
    length_mismatch: u16,
    checksum_fail: u16,
});

binary_layout::binary_layout!(rdm_discovery_response_layout, BigEndian, {
    preamble: [u8; 7],
    separator: u8,
    encoded_uid: [u8; 12],
    encoded_checksum: [u8; 4],
});
