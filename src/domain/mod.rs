pub mod cell;
pub mod character;
pub mod geom;
pub mod maze;
pub mod npc;
pub mod pathfind;
pub mod pursuer;
