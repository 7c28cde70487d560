//! Codec laws over generated schemas and values: every encoding decodes back
//! to its value, every strict prefix underflows, and `serialized_len` agrees
//! with `encode`.

use msgprims_codec::{CodecError, Duration, MessageCodec, MessageValue, Time, Value};
use msgprims_schema::{PrimitiveKind, SchemaRegistry};
use proptest::collection::vec;
use proptest::prelude::*;

const POINT: &str = "geometry_msgs/Point";
const EMPTY: &str = "std_msgs/Empty";

/// Element type of one generated field.
#[derive(Debug, Clone, Copy)]
enum Element {
    Primitive(PrimitiveKind),
    Point,
    Empty,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Scalar,
    Fixed(usize),
    Variable,
}

impl Element {
    fn type_name(self) -> &'static str {
        match self {
            Element::Primitive(kind) => kind.name(),
            Element::Point => POINT,
            Element::Empty => EMPTY,
        }
    }
}

fn base_registry() -> SchemaRegistry {
    SchemaRegistry::from_embedded(&[
        (POINT, "float64 x\nfloat64 y\nfloat64 z\n"),
        (EMPTY, ""),
    ])
    .unwrap()
}

fn element() -> impl Strategy<Value = Element> {
    prop_oneof![
        8 => proptest::sample::select(PrimitiveKind::ALL.to_vec()).prop_map(Element::Primitive),
        1 => Just(Element::Point),
        1 => Just(Element::Empty),
    ]
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        2 => Just(Shape::Scalar),
        1 => (1usize..4).prop_map(Shape::Fixed),
        1 => Just(Shape::Variable),
    ]
}

fn point(x: f64, y: f64, z: f64) -> Value {
    let registry = base_registry();
    let schema = registry.get(POINT).unwrap();
    let message = MessageValue::new(schema, &registry)
        .unwrap()
        .with("x", x)
        .unwrap()
        .with("y", y)
        .unwrap()
        .with("z", z)
        .unwrap();
    Value::Message(message)
}

fn empty() -> Value {
    let registry = base_registry();
    Value::Message(MessageValue::new(registry.get(EMPTY).unwrap(), &registry).unwrap())
}

fn value_of(element: Element) -> BoxedStrategy<Value> {
    match element {
        Element::Primitive(kind) => match kind {
            PrimitiveKind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
            PrimitiveKind::Int8 => any::<i8>().prop_map(Value::I8).boxed(),
            PrimitiveKind::UInt8 => any::<u8>().prop_map(Value::U8).boxed(),
            PrimitiveKind::Int16 => any::<i16>().prop_map(Value::I16).boxed(),
            PrimitiveKind::UInt16 => any::<u16>().prop_map(Value::U16).boxed(),
            PrimitiveKind::Int32 => any::<i32>().prop_map(Value::I32).boxed(),
            PrimitiveKind::UInt32 => any::<u32>().prop_map(Value::U32).boxed(),
            PrimitiveKind::Int64 => any::<i64>().prop_map(Value::I64).boxed(),
            PrimitiveKind::UInt64 => any::<u64>().prop_map(Value::U64).boxed(),
            // NaN never compares equal, so stay on finite values.
            PrimitiveKind::Float32 => (-1.0e6f32..1.0e6).prop_map(Value::F32).boxed(),
            PrimitiveKind::Float64 => (-1.0e12f64..1.0e12).prop_map(Value::F64).boxed(),
            PrimitiveKind::String => "\\PC{0,12}".prop_map(Value::String).boxed(),
            PrimitiveKind::Time => (any::<u32>(), any::<u32>())
                .prop_map(|(secs, nsecs)| Value::Time(Time { secs, nsecs }))
                .boxed(),
            PrimitiveKind::Duration => (any::<i32>(), any::<i32>())
                .prop_map(|(secs, nsecs)| Value::Duration(Duration { secs, nsecs }))
                .boxed(),
        },
        Element::Point => (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6, -1.0e6f64..1.0e6)
            .prop_map(|(x, y, z)| point(x, y, z))
            .boxed(),
        Element::Empty => Just(empty()).boxed(),
    }
}

fn field_value(element: Element, shape: Shape) -> BoxedStrategy<Value> {
    let len = match shape {
        Shape::Scalar => return value_of(element),
        Shape::Fixed(len) => len..=len,
        Shape::Variable => 0..=6,
    };
    match element {
        Element::Primitive(PrimitiveKind::UInt8) => vec(any::<u8>(), len).prop_map(Value::Bytes).boxed(),
        element => vec(value_of(element), len).prop_map(Value::Array).boxed(),
    }
}

/// A field list plus a matching value for each field.
fn message() -> impl Strategy<Value = Vec<(Element, Shape, Value)>> {
    vec((element(), shape()), 0..6).prop_flat_map(|fields| {
        fields
            .into_iter()
            .map(|(element, shape)| {
                field_value(element, shape).prop_map(move |value| (element, shape, value))
            })
            .collect::<Vec<_>>()
    })
}

fn definition(fields: &[(Element, Shape, Value)]) -> String {
    fields
        .iter()
        .enumerate()
        .map(|(index, (element, shape, _))| {
            let suffix = match shape {
                Shape::Scalar => String::new(),
                Shape::Fixed(len) => format!("[{len}]"),
                Shape::Variable => "[]".to_string(),
            };
            format!("{}{suffix} f{index}\n", element.type_name())
        })
        .collect()
}

/// Compile the generated definition and fill a value with the generated fields.
fn build(fields: Vec<(Element, Shape, Value)>) -> (SchemaRegistry, MessageValue) {
    let mut registry = base_registry();
    let schema = registry.compile("test_msgs/Generated", &definition(&fields)).unwrap();
    let mut message = MessageValue::new(&schema, &registry).unwrap();
    for (index, (_, _, value)) in fields.into_iter().enumerate() {
        message.set(&format!("f{index}"), value).unwrap();
    }
    (registry, message)
}

proptest! {
    #[test]
    fn decode_inverts_encode(fields in message()) {
        let (registry, message) = build(fields);
        let schema = registry.get("test_msgs/Generated").unwrap();
        let codec = MessageCodec::new(&registry);

        let bytes = codec.encode(schema, &message).unwrap();
        prop_assert_eq!(codec.decode_exact(schema, &bytes).unwrap(), message);
    }

    #[test]
    fn every_strict_prefix_underflows(fields in message()) {
        let (registry, message) = build(fields);
        let schema = registry.get("test_msgs/Generated").unwrap();
        let codec = MessageCodec::new(&registry);

        let bytes = codec.encode(schema, &message).unwrap();
        for cut in 0..bytes.len() {
            let err = codec.decode(schema, &bytes[..cut], 0).unwrap_err();
            prop_assert!(
                matches!(err, CodecError::BufferUnderflow { .. }),
                "cut {} of {}: {}", cut, bytes.len(), err
            );
        }
    }

    #[test]
    fn serialized_len_matches_encoding(fields in message()) {
        let (registry, message) = build(fields);
        let schema = registry.get("test_msgs/Generated").unwrap();
        let codec = MessageCodec::new(&registry);

        let bytes = codec.encode(schema, &message).unwrap();
        prop_assert_eq!(codec.serialized_len(schema, &message).unwrap(), bytes.len());
    }
}
