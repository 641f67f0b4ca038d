use crate::error::four_cc;
use crate::io::{IoCycleInfo, IoOperation};

#[test]
fn test_operation_ids() {
    assert_eq!(IoOperation::ProcessOutput.id(), four_cc(b"pout"));
    assert_eq!(IoOperation::ReadInput.id(), four_cc(b"read"));
    assert_eq!(IoOperation::WriteMix.id(), four_cc(b"rite"));
    assert_eq!(IoOperation::WriteMix.to_string(), "'rite'");
}

#[test]
fn test_from_id() {
    for op in IoOperation::ALL {
        assert_eq!(IoOperation::from_id(op.id()), Some(op));
    }
    assert_eq!(IoOperation::from_id(four_cc(b"nope")), None);
}

#[test]
fn test_will_do() {
    for op in IoOperation::ALL {
        let answer = op.will_do();
        let expected = matches!(
            op,
            IoOperation::ReadInput | IoOperation::ProcessOutput | IoOperation::WriteMix
        );
        assert_eq!(answer.will_do, expected, "{op}");
        assert!(answer.in_place, "{op}");
    }
}

#[test]
fn test_cycle_info_at() {
    let info = IoCycleInfo::at(7, 512, 1024.0);
    assert_eq!(info.cycle_counter, 7);
    assert_eq!(info.nominal_io_buffer_frame_size, 512);
    assert_eq!(info.input_time.sample_time, 1024.0);
    assert_eq!(info.output_time.sample_time, 1024.0);
}
