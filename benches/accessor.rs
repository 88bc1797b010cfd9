use bytes::{BufMut, BytesMut};
use criterion::{criterion_group, criterion_main, Criterion};
use protolazy::Accessor;

/// A message with twenty varint fields, roughly the shape the pivot default
/// (24) is tuned for: every field lands in the dense storage region.
fn sample_buffer() -> bytes::Bytes {
    let mut buf = BytesMut::new();
    for field in 1..=20u32 {
        let tag = (field << 3) | 0; // varint wire type
        encode_varint(tag as u64, &mut buf);
        encode_varint(field as u64, &mut buf);
    }
    buf.freeze()
}

fn encode_varint(mut value: u64, buf: &mut BytesMut) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

fn index_only(c: &mut Criterion) {
    let source = sample_buffer();
    c.bench_function("accessor_index_only", |b| {
        b.iter(|| {
            let mut a = Accessor::from_buffer(source.clone());
            std::hint::black_box(a.has_field_number(1).unwrap())
        })
    });
}

fn read_all_fields(c: &mut Criterion) {
    let source = sample_buffer();
    c.bench_function("accessor_read_all_fields", |b| {
        b.iter(|| {
            let mut a = Accessor::from_buffer(source.clone());
            let mut total: u32 = 0;
            for field in 1..=20u32 {
                total = total.wrapping_add(a.get_uint32_with_default(field, 0).unwrap());
            }
            std::hint::black_box(total)
        })
    });
}

fn read_then_serialize(c: &mut Criterion) {
    let source = sample_buffer();
    c.bench_function("accessor_read_then_serialize", |b| {
        b.iter(|| {
            let mut a = Accessor::from_buffer(source.clone());
            let _ = a.get_uint32_with_default(1, 0).unwrap();
            std::hint::black_box(a.serialize().unwrap())
        })
    });
}

criterion_group!(accessor, index_only, read_all_fields, read_then_serialize);
criterion_main!(accessor);
