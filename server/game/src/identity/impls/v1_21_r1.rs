identity_adapter!(v1_21_r1, NbtText, "Identity adapter for 1.21 and 1.21.1.");
