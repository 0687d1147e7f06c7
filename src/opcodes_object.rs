//! Item opcodes: parent tests, moves, states, object and class flags
//!
//! Item arguments arrive already resolved, so the null item shows up as id 0.
//! Tests against the null item are false; moves of the null item are ignored.

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::item::{ItemId, SubBlockKind, NULL_ITEM, PLAYER_ITEM};
use crate::opcode_tables::ScriptOp;
use log::debug;

/// Upper bound for item states
pub const MAX_ITEM_STATE: i16 = 30000;

fn item_arg(value: i16) -> ItemId {
    value as ItemId
}

impl Engine {
    fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.items.deref(id).map(|i| i.parent)
    }

    /// Handle item and object opcodes
    pub fn execute_object_op(&mut self, op: ScriptOp, args: &[i16]) -> EngineResult<()> {
        debug!("{} {:?}", op.name(), args);
        match op {
            // ---- conditions ----
            ScriptOp::At | ScriptOp::NotAt => {
                let here = self.parent_of(PLAYER_ITEM) == Some(item_arg(args[0]));
                self.vm.condition = here == (op == ScriptOp::At);
            }
            ScriptOp::Carried | ScriptOp::NotCarried => {
                let carried = self.parent_of(item_arg(args[0])) == Some(PLAYER_ITEM);
                self.vm.condition = carried == (op == ScriptOp::Carried);
            }
            ScriptOp::IsAt => {
                self.vm.condition = self.parent_of(item_arg(args[0])) == Some(item_arg(args[1]));
            }
            ScriptOp::IsRoom | ScriptOp::IsObject => {
                let kind = if op == ScriptOp::IsRoom {
                    SubBlockKind::Room
                } else {
                    SubBlockKind::Object
                };
                self.vm.condition = self
                    .items
                    .deref(item_arg(args[0]))
                    .map_or(false, |i| i.has_sub(kind));
            }
            ScriptOp::State => {
                self.vm.condition = self
                    .items
                    .deref(item_arg(args[0]))
                    .map_or(false, |i| i.state == args[1]);
            }
            ScriptOp::OFlag => {
                let bit = args[1] as u16 as u32;
                self.vm.condition = match self.items.deref(item_arg(args[0])) {
                    Some(item) if item.has_sub(SubBlockKind::Object) => 1u32
                        .checked_shl(bit)
                        .map_or(false, |mask| item.object_flags().bits() & mask != 0),
                    _ => false,
                };
            }
            ScriptOp::CanPut => {
                let result = self.items.can_place(item_arg(args[0]), item_arg(args[1]))?;
                self.write_variable(args[2] as u16 as usize, result)?;
                self.vm.condition = result == 0;
            }
            ScriptOp::IsClass => {
                let bit = args[1] as u16 as u32;
                self.vm.condition = match (self.items.deref(item_arg(args[0])), 1u32.checked_shl(bit)) {
                    (Some(item), Some(mask)) => item.class_flags & mask != 0,
                    _ => false,
                };
            }
            ScriptOp::Here => {
                let parent = self.parent_of(item_arg(args[0]));
                self.vm.condition = parent.is_some()
                    && (parent == Some(PLAYER_ITEM) || parent == self.parent_of(PLAYER_ITEM));
            }

            // ---- moves ----
            ScriptOp::Destroy => {
                let item = item_arg(args[0]);
                if item != NULL_ITEM {
                    self.items.set_item_parent(item, NULL_ITEM)?;
                }
            }
            ScriptOp::Place => {
                let (item, target) = (item_arg(args[0]), item_arg(args[1]));
                if item != NULL_ITEM {
                    match self.items.can_place(item, target)? {
                        0 => self.items.set_item_parent(item, target)?,
                        refused => debug!("place: {} refused by {} ({})", item, target, refused),
                    }
                }
            }
            ScriptOp::Goto => {
                self.items.set_item_parent(PLAYER_ITEM, item_arg(args[0]))?;
            }
            ScriptOp::PutBy => {
                let item = item_arg(args[0]);
                if let Some(parent) = self.parent_of(item_arg(args[1])) {
                    if item != NULL_ITEM {
                        self.items.set_item_parent(item, parent)?;
                    }
                }
            }

            // ---- state and flags ----
            ScriptOp::SetState => {
                let value = args[1].clamp(0, MAX_ITEM_STATE);
                self.items.get_mut(item_arg(args[0]))?.state = value;
            }
            ScriptOp::OSet | ScriptOp::OClear => {
                let item = self.items.get_mut(item_arg(args[0]))?;
                if !item.set_object_flag(args[1] as u16, op == ScriptOp::OSet) {
                    debug!("{}: item {} is not an object", op.name(), args[0]);
                }
            }
            ScriptOp::SetClass | ScriptOp::UnsetClass => {
                let mask = 1u32.checked_shl(args[1] as u16 as u32).unwrap_or(0);
                let item = self.items.get_mut(item_arg(args[0]))?;
                if op == ScriptOp::SetClass {
                    item.class_flags |= mask;
                } else {
                    item.class_flags &= !mask;
                }
            }

            // ---- links into variables ----
            ScriptOp::GetParent | ScriptOp::GetNext | ScriptOp::GetChildren => {
                let value = match self.items.deref(item_arg(args[0])) {
                    Some(item) => match op {
                        ScriptOp::GetParent => item.parent,
                        ScriptOp::GetNext => item.next,
                        _ => item.child,
                    },
                    None => NULL_ITEM,
                };
                self.write_variable(args[1] as u16 as usize, value as i16)?;
            }
            ScriptOp::StoreItem => {
                let slot = args[0] as u16 as usize;
                *self
                    .vm
                    .item_store
                    .get_mut(slot)
                    .ok_or(EngineError::BadVariable(slot))? = item_arg(args[1]);
            }
            ScriptOp::GetItem => {
                let slot = args[0] as u16 as usize;
                let item = *self
                    .vm
                    .item_store
                    .get(slot)
                    .ok_or(EngineError::BadVariable(slot))?;
                self.write_variable(args[1] as u16 as usize, item as i16)?;
            }

            _ => {
                return Err(EngineError::UnregisteredOpcode(
                    VmKind::Script,
                    self.opcodes.opcode_of(op).unwrap_or(0),
                ))
            }
        }
        Ok(())
    }
}
