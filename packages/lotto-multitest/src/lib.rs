// Testing utils. See tests folder for actual tests.

use cosmwasm_std::{Addr, Attribute, Coin, Uint128};
use cw_multi_test::{App, BankSudo, SudoMsg};

/// Gets the value of the first attribute with the given key
pub fn first_attr(data: impl AsRef<[Attribute]>, search_key: &str) -> Option<String> {
    data.as_ref().iter().find_map(|a| {
        if a.key == search_key {
            Some(a.value.clone())
        } else {
            None
        }
    })
}

pub fn mint_native(app: &mut App, beneficiary: &Addr, denom: &str, amount: u128) {
    app.sudo(SudoMsg::Bank(BankSudo::Mint {
        to_address: beneficiary.to_string(),
        amount: vec![Coin::new(amount, denom)],
    }))
    .unwrap();
}

pub fn query_balance_native(app: &App, address: &Addr, denom: &str) -> Uint128 {
    app.wrap().query_balance(address, denom).unwrap().amount
}
