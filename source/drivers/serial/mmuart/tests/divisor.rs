//! CONTEXT: Property tests for MMUART baud divisor computation
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 2 property tests
//!
//! TEST_SCOPE:
//!   - Produced baud stays within 1% of the request across the usable range
//!   - Fraction is always a valid 6-bit DFR value
//!
//! DEPENDENCIES:
//!   - serial_mmuart::BaudDivisor: divisor arithmetic

use proptest::prelude::*;
use serial_mmuart::BaudDivisor;

const PCLK: u32 = 150_000_000;

proptest! {
    #[test]
    fn actual_baud_within_one_percent(baud in 1_200u32..=1_000_000) {
        let divisor = BaudDivisor::compute(PCLK, baud).unwrap();
        let actual = divisor.actual_baud(PCLK) as i64;
        let error = (actual - baud as i64).abs();
        prop_assert!(error * 100 <= baud as i64, "baud {} produced {}", baud, actual);
    }

    #[test]
    fn fraction_fits_dfr(pclk in 1_000_000u32..=600_000_000, baud in 9_600u32..=921_600) {
        if let Ok(divisor) = BaudDivisor::compute(pclk, baud) {
            prop_assert!(divisor.fraction < 64);
            prop_assert!(divisor.integer >= 1);
        }
    }
}
