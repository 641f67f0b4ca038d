use byteorder::{ByteOrder, NativeEndian};

use crate::device::DeviceController;
use crate::error::DriverError;
use crate::io::{IoCycleInfo, IoOperation};
use crate::property::{CHANGE_SAMPLE_RATE, PropertyAddress, Selector, SetOutcome};
use crate::testing::{controller_with, test_config};
use crate::types::{ClientId, DriverConfig, ObjectId};

const DEVICE: ObjectId = ObjectId::DEVICE;

fn controller() -> (DeviceController, std::sync::Arc<crate::testing::MockHost>) {
    controller_with(test_config()).unwrap()
}

#[test]
fn test_invalid_config_rejected() {
    let config = DriverConfig::builder().channels(0).build();
    let err = controller_with(config).unwrap_err();
    assert!(matches!(err, DriverError::InvalidConfig { field: "channels", .. }));
}

#[test]
fn test_create_and_destroy_unsupported() {
    let (controller, _) = controller();
    assert!(matches!(
        controller.create_device("x", None),
        Err(DriverError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        controller.destroy_device(DEVICE),
        Err(DriverError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_client_lifecycle() {
    let (controller, _) = controller();
    controller.add_client(DEVICE, ClientId(1), 100).unwrap();
    controller.set_client_gain(ClientId(1), 0.5).unwrap();
    assert_eq!(controller.client_gain(ClientId(1)), Some(0.5));

    let info = controller.remove_client(DEVICE, ClientId(1)).unwrap();
    assert_eq!(info.process_id, 100);
    assert_eq!(controller.client_gain(ClientId(1)), None);
    assert_eq!(controller.registry().gains().current_gain(ClientId(1)), 1.0);
    assert!(controller.clients().is_empty());
}

#[test]
fn test_wrong_device_id() {
    let (controller, _) = controller();
    let err = controller
        .add_client(ObjectId::OUTPUT_STREAM, ClientId(1), 100)
        .unwrap_err();
    assert!(matches!(err, DriverError::UnknownObject(ObjectId::OUTPUT_STREAM)));
    assert!(controller.start_io(ObjectId(9), ClientId(1)).is_err());
    assert!(controller.zero_time_stamp(ObjectId(9)).is_err());
}

#[test]
fn test_running_notifications() {
    let (controller, host) = controller();
    controller.add_client(DEVICE, ClientId(1), 100).unwrap();
    controller.add_client(DEVICE, ClientId(2), 100).unwrap();

    controller.start_io(DEVICE, ClientId(1)).unwrap();
    assert!(host.was_notified(DEVICE, Selector::DEVICE_IS_RUNNING));

    host.clear();
    controller.start_io(DEVICE, ClientId(2)).unwrap();
    controller.stop_io(DEVICE, ClientId(1)).unwrap();
    assert!(host.notifications().is_empty());

    controller.stop_io(DEVICE, ClientId(2)).unwrap();
    assert!(host.was_notified(DEVICE, Selector::DEVICE_IS_RUNNING));
}

#[test]
fn test_stop_io_not_started_is_ok() {
    let (controller, host) = controller();
    controller.add_client(DEVICE, ClientId(1), 100).unwrap();
    controller.stop_io(DEVICE, ClientId(1)).unwrap();
    assert!(host.notifications().is_empty());
}

#[test]
fn test_remove_client_stops_io() {
    let (controller, host) = controller();
    controller.add_client(DEVICE, ClientId(1), 100).unwrap();
    controller.start_io(DEVICE, ClientId(1)).unwrap();
    host.clear();

    controller.remove_client(DEVICE, ClientId(1)).unwrap();
    assert!(!controller.engine().is_running());
    assert!(host.was_notified(DEVICE, Selector::DEVICE_IS_RUNNING));
}

#[test]
fn test_sample_rate_change_flow() {
    let (controller, host) = controller();
    let address = PropertyAddress::global(Selector::NOMINAL_SAMPLE_RATE);
    let seed_before = controller.zero_time_stamp(DEVICE).unwrap().seed;

    let outcome = controller
        .set_property_data(DEVICE, &address, &[], &96_000.0f64.to_ne_bytes())
        .unwrap();
    assert!(matches!(outcome, SetOutcome::ConfigurationChangeRequested { .. }));
    assert_eq!(host.change_requests(), vec![(DEVICE, CHANGE_SAMPLE_RATE)]);
    assert!(host.notifications().is_empty());

    controller
        .perform_configuration_change(DEVICE, CHANGE_SAMPLE_RATE)
        .unwrap();
    let data = controller
        .get_property_data(DEVICE, &address, &[], 8)
        .unwrap();
    assert_eq!(NativeEndian::read_f64(&data), 96_000.0);
    assert!(host.was_notified(DEVICE, Selector::NOMINAL_SAMPLE_RATE));
    assert!(host.was_notified(ObjectId::OUTPUT_STREAM, Selector::STREAM_VIRTUAL_FORMAT));
    assert_eq!(
        controller.zero_time_stamp(DEVICE).unwrap().seed,
        seed_before + 1
    );
}

#[test]
fn test_abort_configuration_change() {
    let (controller, host) = controller();
    let address = PropertyAddress::global(Selector::NOMINAL_SAMPLE_RATE);
    controller
        .set_property_data(DEVICE, &address, &[], &44_100.0f64.to_ne_bytes())
        .unwrap();

    controller
        .abort_configuration_change(DEVICE, CHANGE_SAMPLE_RATE)
        .unwrap();
    controller
        .perform_configuration_change(DEVICE, CHANGE_SAMPLE_RATE)
        .unwrap();
    assert_eq!(controller.properties().sample_rate(), 48_000.0);
    assert!(!host.was_notified(DEVICE, Selector::NOMINAL_SAMPLE_RATE));
}

#[test]
fn test_set_property_notifies() {
    let (controller, host) = controller();
    controller
        .set_property_data(
            ObjectId::INPUT_STREAM,
            &PropertyAddress::global(Selector::STREAM_IS_ACTIVE),
            &[],
            &0u32.to_ne_bytes(),
        )
        .unwrap();
    assert!(host.was_notified(ObjectId::INPUT_STREAM, Selector::STREAM_IS_ACTIVE));
}

#[test]
fn test_process_gain() {
    let (controller, host) = controller();
    controller.add_client(DEVICE, ClientId(1), 100).unwrap();
    controller.add_client(DEVICE, ClientId(2), 100).unwrap();

    assert_eq!(controller.set_process_gain(100, 0.0).unwrap(), 2);
    assert_eq!(controller.client_gain(ClientId(1)), Some(0.0));
    assert_eq!(controller.client_gain(ClientId(2)), Some(0.0));
    assert!(host.was_notified(DEVICE, Selector::CLIENT_GAIN));
}

#[test]
fn test_will_do() {
    let (controller, _) = controller();
    let answer = controller
        .will_do_io_operation(DEVICE, IoOperation::ProcessOutput.id())
        .unwrap();
    assert!(answer.will_do && answer.in_place);

    let answer = controller
        .will_do_io_operation(DEVICE, IoOperation::ConvertMix.id())
        .unwrap();
    assert!(!answer.will_do && answer.in_place);

    let answer = controller.will_do_io_operation(DEVICE, 0).unwrap();
    assert!(!answer.will_do);
}

#[test]
fn test_render_through_controller() {
    let (controller, _) = controller();
    controller.add_client(DEVICE, ClientId(1), 100).unwrap();
    controller.start_io(DEVICE, ClientId(1)).unwrap();
    controller.set_client_gain(ClientId(1), 0.0).unwrap();

    let info = IoCycleInfo::at(0, 4, 0.0);
    let mut buffer = [1.0f32; 8];
    controller.begin_io_operation(DEVICE, ClientId(1), IoOperation::ProcessOutput, 4, &info);
    controller.do_io_operation(
        DEVICE,
        ObjectId::OUTPUT_STREAM,
        ClientId(1),
        IoOperation::ProcessOutput,
        4,
        &info,
        &mut buffer,
    );
    controller.end_io_operation(DEVICE, ClientId(1), IoOperation::ProcessOutput, 4, &info);
    assert_eq!(buffer, [0.75, 0.75, 0.5, 0.5, 0.25, 0.25, 0.0, 0.0]);

    // Wrong device id on the render path is ignored
    let mut untouched = [1.0f32; 8];
    controller.do_io_operation(
        ObjectId(9),
        ObjectId::OUTPUT_STREAM,
        ClientId(1),
        IoOperation::ProcessOutput,
        4,
        &info,
        &mut untouched,
    );
    assert_eq!(untouched, [1.0; 8]);
}
