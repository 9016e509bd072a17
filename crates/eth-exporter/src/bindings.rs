//! Contract bindings via `alloy::sol!`.
//!
//! Only the functions/events we actually use are included.

use alloy_sol_types::sol;

// ── ERC-20 ───────────────────────────────────────────────────

sol! {
    interface ERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}
