//! Shows `Accessor` used directly, the way a generated message wrapper would
//! use it under the hood: wrap a buffer, read a few typed fields, mutate one,
//! attach a sub-message, and re-serialize.

use protolazy::{Accessor, AccessorHandle, Checks};

fn main() {
    // A tiny encoded message: field 1 (bool) = true, field 2 (string) = "ok".
    let wire: &[u8] = &[0x08, 0x01, 0x12, 0x02, b'o', b'k'];
    let mut person = Accessor::from_buffer(wire.to_vec());

    println!("active = {}", person.get_bool_with_default(1, false).unwrap());
    println!("status = {}", person.get_string_with_default(2, "<unset>").unwrap().as_str());

    // Mutate a scalar field in place, without re-parsing the whole buffer.
    person.set_bool(1, false).unwrap();

    // Attach an empty sub-message to field 3 and populate it.
    let address: AccessorHandle =
        person.get_message_attach(3, |handle| handle, None).unwrap();
    address.borrow_mut().set_string(1, "Springfield").unwrap();

    let out = person.serialize().unwrap();
    println!("re-encoded: {out:02x?}");

    // A `RELEASE`-checks accessor skips bounds/type validation for speed.
    let mut fast = Accessor::new_empty().with_checks(Checks::RELEASE);
    fast.set_int32(1, 42).unwrap();
    println!("fast.get_int32(1) = {}", fast.get_int32(1).unwrap());
}
