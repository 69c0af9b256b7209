//! Typed keys into the runtime's arenas, backed by [`reactor_tinymap`].

reactor_tinymap::key_type!(pub ReactorKey);
reactor_tinymap::key_type!(pub ReactionKey);
reactor_tinymap::key_type!(pub PortKey);
reactor_tinymap::key_type!(pub ActionKey);
