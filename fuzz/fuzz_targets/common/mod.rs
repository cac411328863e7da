use arbitrary::Arbitrary;
use bitvec::{order::Msb0, view::BitView};

/// Two paths sharing exactly `prefix_bit_len` leading bits.
#[derive(Debug)]
pub struct SharedPrefix {
    pub prefix_bit_len: usize,
    pub a: [u8; 32],
    pub b: [u8; 32],
}

impl<'a> Arbitrary<'a> for SharedPrefix {
    fn arbitrary(input: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let prefix_bit_len = input.int_in_range(0..=256)?;
        let mut a = [0; 32];
        let mut b = [0; 32];
        input.fill_buffer(&mut a)?;
        input.fill_buffer(&mut b)?;
        b.view_bits_mut::<Msb0>()[0..prefix_bit_len]
            .copy_from_bitslice(&a.view_bits::<Msb0>()[0..prefix_bit_len]);

        // the bit right after the prefix must differ, if there is one.
        if prefix_bit_len < 256 {
            let differs = !a.view_bits::<Msb0>()[prefix_bit_len];
            b.view_bits_mut::<Msb0>().set(prefix_bit_len, differs);
        }

        Ok(Self {
            prefix_bit_len,
            a,
            b,
        })
    }
}
