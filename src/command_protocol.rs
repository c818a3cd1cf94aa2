use serde_json::Value;

use crate::types::{AbilityId, Command, ShopItem, UpgradeId};

/// Parses one JSON command line. Range checks are left to the engine so
/// that out-of-range input still surfaces as a rejection event.
pub fn parse_command(raw: &str) -> Option<Command> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let command_type = object.get("type")?.as_str()?;

    match command_type {
        "move" => {
            let dx = parse_i32(object.get("dx")?)?;
            let dy = parse_i32(object.get("dy")?)?;
            Some(Command::Move { dx, dy })
        }
        "wait" => Some(Command::Wait),
        "use_ability" => {
            let ability = AbilityId::parse(object.get("ability")?.as_str()?)?;
            Some(Command::UseAbility { ability })
        }
        "select_ranged_weapon" => {
            let slot = usize::try_from(object.get("slot")?.as_u64()?).ok()?;
            Some(Command::SelectRangedWeapon { slot })
        }
        "ranged_attack" => {
            let x = parse_i32(object.get("x")?)?;
            let y = parse_i32(object.get("y")?)?;
            Some(Command::RangedAttack { x, y })
        }
        "confirm_floor_transition" => Some(Command::ConfirmFloorTransition),
        "cancel_targeting" => Some(Command::CancelTargeting),
        "purchase_upgrade" => {
            let upgrade = UpgradeId::parse(object.get("upgrade")?.as_str()?)?;
            Some(Command::PurchaseUpgrade { upgrade })
        }
        "purchase_shop_item" => {
            let item = ShopItem::parse(object.get("item")?.as_str()?)?;
            Some(Command::PurchaseShopItem { item })
        }
        _ => None,
    }
}

fn parse_i32(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|number| i32::try_from(number).ok())
}
