identity_adapter!(v1_20_r3, NbtText, "Identity adapter for 1.20.3 and 1.20.4, the first revision sending chat components as NBT.");
