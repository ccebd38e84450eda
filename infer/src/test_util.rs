//! Tiny ONNX graphs for tests, encoded by hand so no model files need to
//! be checked in.
//!
//! The identity graph has one rank-4 float input `x`, one output `y = x`, and
//! optionally extra boolean scalar inputs that no node consumes (used to feed
//! training-phase flags).

use std::fs;
use std::path::{Path, PathBuf};

const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;

const ELEM_FLOAT: u64 = 1;
const ELEM_BOOL: u64 = 9;

fn varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn field_varint(out: &mut Vec<u8>, field: u64, v: u64) {
    varint(out, (field << 3) | WIRE_VARINT);
    varint(out, v);
}

fn field_bytes(out: &mut Vec<u8>, field: u64, bytes: &[u8]) {
    varint(out, (field << 3) | WIRE_LEN);
    varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// `ValueInfoProto` for a tensor with symbolic dims.
fn value_info(name: &str, elem_type: u64, dim_params: &[&str]) -> Vec<u8> {
    let mut shape = Vec::new();
    for param in dim_params {
        let mut dim = Vec::new();
        field_bytes(&mut dim, 2, param.as_bytes()); // Dimension.dim_param
        field_bytes(&mut shape, 1, &dim); // TensorShapeProto.dim
    }

    let mut tensor_type = Vec::new();
    field_varint(&mut tensor_type, 1, elem_type); // TypeProto.Tensor.elem_type
    field_bytes(&mut tensor_type, 2, &shape); // TypeProto.Tensor.shape

    let mut type_proto = Vec::new();
    field_bytes(&mut type_proto, 1, &tensor_type); // TypeProto.tensor_type

    let mut info = Vec::new();
    field_bytes(&mut info, 1, name.as_bytes()); // ValueInfoProto.name
    field_bytes(&mut info, 2, &type_proto); // ValueInfoProto.type
    info
}

/// Serialized ONNX model computing `y = Identity(x)`.
///
/// `flags` names extra boolean scalar inputs.
pub fn identity_model(flags: &[&str]) -> Vec<u8> {
    let mut node = Vec::new();
    field_bytes(&mut node, 1, b"x"); // NodeProto.input
    field_bytes(&mut node, 2, b"y"); // NodeProto.output
    field_bytes(&mut node, 3, b"identity"); // NodeProto.name
    field_bytes(&mut node, 4, b"Identity"); // NodeProto.op_type

    let mut graph = Vec::new();
    field_bytes(&mut graph, 1, &node); // GraphProto.node
    field_bytes(&mut graph, 2, b"sicnn_identity"); // GraphProto.name
    field_bytes(&mut graph, 11, &value_info("x", ELEM_FLOAT, &["batch", "frames", "bands", "channels"]));
    for flag in flags {
        field_bytes(&mut graph, 11, &value_info(flag, ELEM_BOOL, &[]));
    }
    field_bytes(&mut graph, 12, &value_info("y", ELEM_FLOAT, &["batch", "frames", "bands", "channels"]));

    let mut opset = Vec::new();
    field_bytes(&mut opset, 1, b""); // OperatorSetIdProto.domain
    field_varint(&mut opset, 2, 13); // OperatorSetIdProto.version

    let mut model = Vec::new();
    field_varint(&mut model, 1, 8); // ModelProto.ir_version
    field_bytes(&mut model, 2, b"sicnn-test"); // ModelProto.producer_name
    field_bytes(&mut model, 7, &graph); // ModelProto.graph
    field_bytes(&mut model, 8, &opset); // ModelProto.opset_import
    model
}

/// Writes [`identity_model`] to `dir/name` and returns the path.
pub fn write_identity_model(dir: &Path, name: &str, flags: &[&str]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, identity_model(flags)).expect("write identity model");
    path
}
