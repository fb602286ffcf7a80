//! Cache Function Table
//!
//! Names and descriptions of the 5-bit `op` field of the `cache` instruction.
//! `I*` operations target the instruction cache, `D*` the data cache and `B*` the
//! branch target address cache. Unknown selectors render as `"UNKNOWN"`.

/// Placeholder for selectors with no defined operation.
pub const UNKNOWN_CACHE_FUNCTION: &str = "UNKNOWN";

struct CacheFunction {
    code: u8,
    name: &'static str,
    comment: &'static str,
}

static CACHE_FUNCTIONS: &[CacheFunction] = &[
    CacheFunction { code: 0x00, name: "ixltg", comment: "Read tag from specified icache entry to TagLo" },
    CacheFunction { code: 0x01, name: "ixldt", comment: "Read data from specified icache entry to TagLo, and steering bits and BHT to TagHi" },
    CacheFunction { code: 0x02, name: "bxlbt", comment: "Read BTACache entry. FetchAddr to TagLo TargetAddr to TagHi" },
    CacheFunction { code: 0x04, name: "ixstg", comment: "Write tag from TagLo to specified icache entry" },
    CacheFunction { code: 0x05, name: "ixsdt", comment: "Write instruction from TagLo to specified icache entry, also write steering bits from TagHi" },
    CacheFunction { code: 0x06, name: "bxsbt", comment: "Write TagLo to FetchAddr and TagHi to TargetAddr of BTACache entry" },
    CacheFunction { code: 0x07, name: "ixin", comment: "Invalidate specified icache index entry" },
    CacheFunction { code: 0x0A, name: "bhinbt", comment: "Partially invalidate BTACache" },
    CacheFunction { code: 0x0B, name: "ihin", comment: "Invalidate specified icache entry" },
    CacheFunction { code: 0x0C, name: "bfh", comment: "Invalidates all BTACache entries" },
    CacheFunction { code: 0x0E, name: "ifl", comment: "Read data from memory into specified icache entry" },
    CacheFunction { code: 0x10, name: "dxltg", comment: "Read specified dcache tag entry to TagLo" },
    CacheFunction { code: 0x11, name: "dxldt", comment: "Read data from specified dcache entry to TagLo" },
    CacheFunction { code: 0x12, name: "dxstg", comment: "Write tag from TagLo to specified dcache entry" },
    CacheFunction { code: 0x13, name: "dxsdt", comment: "Write data from TagLo to specified dcache entry" },
    CacheFunction { code: 0x14, name: "dxwbin", comment: "Write specified dcache entry back to memory and invalidate index" },
    CacheFunction { code: 0x16, name: "dxin", comment: "Invalidate specified dcache index entry" },
    CacheFunction { code: 0x18, name: "dhwbin", comment: "Write specified dcache entry back to memory and invalidate it" },
    CacheFunction { code: 0x1A, name: "dhin", comment: "Invalidate specified dcache entry" },
    CacheFunction { code: 0x1C, name: "dhwoin", comment: "Write dcache entry back to memory, don't invalidate" },
];

fn find(code: u8) -> Option<&'static CacheFunction> {
    CACHE_FUNCTIONS.iter().find(|function| function.code == code)
}

/// Short name of a cache function selector.
pub fn cache_function_name(code: u8) -> &'static str {
    find(code).map_or(UNKNOWN_CACHE_FUNCTION, |function| function.name)
}

/// Sentence describing a cache function selector, used as an automatic comment.
pub fn cache_function_comment(code: u8) -> &'static str {
    find(code).map_or(UNKNOWN_CACHE_FUNCTION, |function| function.comment)
}

/// Every defined selector, in ascending order.
pub fn known_cache_functions() -> impl Iterator<Item = u8> {
    CACHE_FUNCTIONS.iter().map(|function| function.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        assert_eq!(cache_function_name(0x07), "ixin");
        assert_eq!(cache_function_name(0x1C), "dhwoin");
        assert_eq!(
            cache_function_comment(0x14),
            "Write specified dcache entry back to memory and invalidate index"
        );
    }

    #[test]
    fn test_unknown_selectors() {
        for code in [0x03, 0x08, 0x09, 0x0D, 0x0F, 0x15, 0x17, 0x19, 0x1B, 0x1D, 0x1E, 0x1F] {
            assert_eq!(cache_function_name(code), UNKNOWN_CACHE_FUNCTION);
            assert_eq!(cache_function_comment(code), UNKNOWN_CACHE_FUNCTION);
        }
    }

    #[test]
    fn test_selectors_are_unique_and_sorted() {
        let codes: Vec<u8> = known_cache_functions().collect();
        assert!(codes.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(codes.iter().all(|&code| code < 0x20));
    }
}
